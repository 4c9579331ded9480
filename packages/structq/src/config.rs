use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use structq_common::retrieval_model::{Bm25Params, IndriParams, RetrievalModel};
use structq_common::tokenize::AsciiTokenizer;
use structq_common::DEFAULT_FIELD;

use crate::letor::NUM_FEATURES;
use crate::{Error, Result};

fn get_default_max_results() -> usize {
    100
}

fn get_default_fb_docs() -> usize {
    10
}

fn get_default_fb_terms() -> usize {
    10
}

fn get_default_fb_orig_weight() -> f64 {
    0.5
}

fn get_default_fb_field() -> String {
    DEFAULT_FIELD.to_owned()
}

fn get_default_svm_c() -> f64 {
    0.001
}

fn get_default_trusted_domain() -> String {
    "wikipedia.org".to_owned()
}

fn get_default_max_candidates() -> usize {
    100
}

fn get_default_svm_rank_learn_path() -> PathBuf {
    PathBuf::from("svm_rank_learn")
}

fn get_default_svm_rank_classify_path() -> PathBuf {
    PathBuf::from("svm_rank_classify")
}

fn get_default_model_file() -> PathBuf {
    PathBuf::from("letor.model")
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct FeedbackConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "get_default_fb_docs")]
    pub fb_docs: usize,
    #[serde(default = "get_default_fb_terms")]
    pub fb_terms: usize,
    #[serde(default)]
    pub fb_mu: f64,
    #[serde(default = "get_default_fb_orig_weight")]
    pub fb_orig_weight: f64,
    #[serde(default = "get_default_fb_field")]
    pub field: String,
    /// TREC run file used as the initial ranking instead of running the query
    #[serde(default)]
    pub initial_ranking_file: Option<PathBuf>,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        FeedbackConfig {
            enabled: false,
            fb_docs: get_default_fb_docs(),
            fb_terms: get_default_fb_terms(),
            fb_mu: 0.0,
            fb_orig_weight: get_default_fb_orig_weight(),
            field: get_default_fb_field(),
            initial_ranking_file: None,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct LetorConfig {
    #[serde(default = "get_default_svm_c")]
    pub svm_c: f64,
    #[serde(default)]
    pub bm25: Bm25Params,
    #[serde(default)]
    pub indri: IndriParams,
    #[serde(default = "get_default_trusted_domain")]
    pub trusted_domain: String,
    /// Feature numbers, starting from 1, left out of feature files
    #[serde(default)]
    pub feature_disable: Vec<usize>,
    #[serde(default = "get_default_max_candidates")]
    pub max_candidates: usize,
    #[serde(default = "get_default_svm_rank_learn_path")]
    pub svm_rank_learn_path: PathBuf,
    #[serde(default = "get_default_svm_rank_classify_path")]
    pub svm_rank_classify_path: PathBuf,
    #[serde(default = "get_default_model_file")]
    pub model_file: PathBuf,
}

impl Default for LetorConfig {
    fn default() -> Self {
        LetorConfig {
            svm_c: get_default_svm_c(),
            bm25: Bm25Params::default(),
            indri: IndriParams::default(),
            trusted_domain: get_default_trusted_domain(),
            feature_disable: Vec::new(),
            max_candidates: get_default_max_candidates(),
            svm_rank_learn_path: get_default_svm_rank_learn_path(),
            svm_rank_classify_path: get_default_svm_rank_classify_path(),
            model_file: get_default_model_file(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct StructqConfig {
    #[serde(default)]
    pub retrieval_model: RetrievalModel,
    #[serde(default = "get_default_max_results")]
    pub max_results: usize,
    #[serde(default)]
    pub feedback: FeedbackConfig,
    #[serde(default)]
    pub letor: LetorConfig,
    /// Snowball stemmer language applied to query terms, none by default
    #[serde(default)]
    pub stemmer: Option<String>,
}

impl Default for StructqConfig {
    fn default() -> Self {
        StructqConfig {
            retrieval_model: RetrievalModel::default(),
            max_results: get_default_max_results(),
            feedback: FeedbackConfig::default(),
            letor: LetorConfig::default(),
            stemmer: None,
        }
    }
}

fn check_bm25(params: &Bm25Params, section: &str) -> Result<()> {
    if !(params.k1 >= 0.0) || !(0.0..=1.0).contains(&params.b) || !(params.k3 >= 0.0) {
        return Err(Error::Config(format!(
            "{} BM25 parameters need k1 >= 0, 0 <= b <= 1 and k3 >= 0, got {:?}",
            section, params,
        )));
    }
    Ok(())
}

fn check_indri(params: &IndriParams, section: &str) -> Result<()> {
    if !(params.mu >= 0.0) || !(0.0..=1.0).contains(&params.lambda) {
        return Err(Error::Config(format!(
            "{} Indri parameters need mu >= 0 and 0 <= lambda <= 1, got {:?}",
            section, params,
        )));
    }
    Ok(())
}

impl StructqConfig {
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: StructqConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Query tokenizer matching the index's analysis
    pub fn tokenizer(&self) -> AsciiTokenizer {
        match &self.stemmer {
            Some(language) => AsciiTokenizer::default().with_stemmer(language),
            None => AsciiTokenizer::default(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        StructqConfig::from_json(&fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<()> {
        match &self.retrieval_model {
            RetrievalModel::Bm25(params) => check_bm25(params, "retrieval_model")?,
            RetrievalModel::Indri(params) => check_indri(params, "retrieval_model")?,
            RetrievalModel::UnrankedBoolean | RetrievalModel::RankedBoolean => {}
        }

        let feedback = &self.feedback;
        if !(0.0..=1.0).contains(&feedback.fb_orig_weight) {
            return Err(Error::Config(format!(
                "fb_orig_weight must be within [0, 1], got {}",
                feedback.fb_orig_weight,
            )));
        }
        if !(feedback.fb_mu >= 0.0) {
            return Err(Error::Config(format!("fb_mu must be non-negative, got {}", feedback.fb_mu)));
        }
        if feedback.enabled {
            if feedback.fb_docs == 0 || feedback.fb_terms == 0 {
                return Err(Error::Config("fb_docs and fb_terms must be positive".to_owned()));
            }
            if !matches!(self.retrieval_model, RetrievalModel::Indri(_)) {
                return Err(Error::Config(format!(
                    "query expansion needs the indri retrieval model, not {}",
                    self.retrieval_model,
                )));
            }
        }

        check_bm25(&self.letor.bm25, "letor")?;
        check_indri(&self.letor.indri, "letor")?;
        if !(self.letor.svm_c >= 0.0) {
            return Err(Error::Config(format!("svm_c must be non-negative, got {}", self.letor.svm_c)));
        }
        if let Some(feature) = self.letor.feature_disable.iter().find(|&&f| f == 0 || f > NUM_FEATURES) {
            return Err(Error::Config(format!(
                "feature_disable holds feature {}, features are numbered 1 to {}",
                feature, NUM_FEATURES,
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use structq_common::retrieval_model::{Bm25Params, IndriParams, RetrievalModel};
    use structq_common::tokenize::QueryTokenizer;

    use super::StructqConfig;
    use crate::Error;

    #[test]
    fn test_defaults() {
        let config = StructqConfig::from_json("{}").unwrap();

        assert_eq!(config.retrieval_model, RetrievalModel::Bm25(Bm25Params { k1: 1.2, b: 0.75, k3: 0.0 }));
        assert_eq!(config.max_results, 100);
        assert!(!config.feedback.enabled);
        assert_eq!(config.feedback.fb_docs, 10);
        assert_eq!(config.feedback.field, "body");
        assert_eq!(config.letor.trusted_domain, "wikipedia.org");
        assert_eq!(config.letor.svm_c, 0.001);
    }

    #[test]
    fn test_retrieval_models() {
        let config = StructqConfig::from_json(r#"{ "retrieval_model": { "model": "indri", "mu": 1000 } }"#).unwrap();
        assert_eq!(config.retrieval_model, RetrievalModel::Indri(IndriParams { mu: 1000.0, lambda: 0.4 }));

        let config = StructqConfig::from_json(r#"{ "retrieval_model": { "model": "ranked_boolean" } }"#).unwrap();
        assert_eq!(config.retrieval_model, RetrievalModel::RankedBoolean);

        assert!(matches!(
            StructqConfig::from_json(r#"{ "retrieval_model": { "model": "tfidf" } }"#),
            Err(Error::Json(_)),
        ));
    }

    #[test]
    fn test_feedback() {
        let config = StructqConfig::from_json(
            r#"{
                "retrieval_model": { "model": "indri" },
                "feedback": { "enabled": true, "fb_docs": 5, "fb_terms": 20, "fb_mu": 0, "fb_orig_weight": 0.3 }
            }"#,
        )
        .unwrap();
        assert_eq!(config.feedback.fb_terms, 20);
        assert_eq!(config.feedback.fb_orig_weight, 0.3);

        assert!(matches!(
            StructqConfig::from_json(r#"{ "feedback": { "enabled": true } }"#),
            Err(Error::Config(_)),
        ));
    }

    #[test]
    fn test_stemmer() {
        let config = StructqConfig::from_json(r#"{ "stemmer": "english" }"#).unwrap();
        assert_eq!(config.tokenizer().tokenize("Running cats"), vec!["run", "cat"]);

        let config = StructqConfig::from_json("{}").unwrap();
        assert_eq!(config.tokenizer().tokenize("Running cats"), vec!["running", "cats"]);
    }

    #[test]
    fn test_invalid_parameters() {
        for raw in &[
            r#"{ "retrieval_model": { "model": "bm25", "b": 1.5 } }"#,
            r#"{ "retrieval_model": { "model": "bm25", "k1": -1 } }"#,
            r#"{ "retrieval_model": { "model": "indri", "lambda": 2 } }"#,
            r#"{ "feedback": { "fb_orig_weight": 1.1 } }"#,
            r#"{ "letor": { "feature_disable": [0] } }"#,
            r#"{ "letor": { "feature_disable": [19] } }"#,
        ] {
            assert!(matches!(StructqConfig::from_json(raw), Err(Error::Config(_))), "{}", raw);
        }
    }
}
