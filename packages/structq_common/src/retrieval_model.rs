use std::fmt;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::utils::idf::get_bm25_idf;

fn get_default_k1() -> f64 {
    1.2
}

fn get_default_b() -> f64 {
    0.75
}

fn get_default_k3() -> f64 {
    0.0
}

fn get_default_mu() -> f64 {
    2500.0
}

fn get_default_lambda() -> f64 {
    0.4
}

#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bm25Params {
    #[cfg_attr(feature = "config", serde(default = "get_default_k1"))]
    pub k1: f64,
    #[cfg_attr(feature = "config", serde(default = "get_default_b"))]
    pub b: f64,
    #[cfg_attr(feature = "config", serde(default = "get_default_k3"))]
    pub k3: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Bm25Params { k1: get_default_k1(), b: get_default_b(), k3: get_default_k3() }
    }
}

impl Bm25Params {
    /// Okapi BM25 score of one term in one document.
    ///
    /// `qtf` is the term's frequency in the query.
    pub fn term_score(
        &self,
        tf: f64,
        df: f64,
        num_docs: f64,
        doc_len: f64,
        avg_doc_len: f64,
        qtf: f64,
    ) -> f64 {
        let idf = get_bm25_idf(num_docs, df);

        let len_ratio = if avg_doc_len > 0.0 { doc_len / avg_doc_len } else { 0.0 };
        let tf_weight = tf / (tf + self.k1 * ((1.0 - self.b) + self.b * len_ratio));
        let user_weight = (self.k3 + 1.0) * qtf / (self.k3 + qtf);

        idf * tf_weight * user_weight
    }
}

#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IndriParams {
    #[cfg_attr(feature = "config", serde(default = "get_default_mu"))]
    pub mu: f64,
    #[cfg_attr(feature = "config", serde(default = "get_default_lambda"))]
    pub lambda: f64,
}

impl Default for IndriParams {
    fn default() -> Self {
        IndriParams { mu: get_default_mu(), lambda: get_default_lambda() }
    }
}

impl IndriParams {
    /// Two-stage smoothed probability of a term with frequency `tf`
    /// in a document of length `doc_len`.
    ///
    /// `mle` is the term's collection probability, ctf / collection length.
    /// With `mu = 0` a document without text in the field has no document
    /// model, and only the collection part remains.
    pub fn term_score(&self, tf: f64, mle: f64, doc_len: f64) -> f64 {
        let smoothed_len = doc_len + self.mu;
        if smoothed_len <= 0.0 {
            return self.lambda * mle;
        }

        (1.0 - self.lambda) * (tf + self.mu * mle) / smoothed_len + self.lambda * mle
    }
}

/// Collection probability of a term, ctf / collection length.
///
/// Terms never seen in the field still receive a small non-zero probability
/// so that default scores and their logarithms stay finite.
pub fn collection_probability(ctf: u64, collection_len: u64) -> f64 {
    if collection_len == 0 {
        return 0.0;
    }

    let ctf = if ctf == 0 { 0.5 } else { ctf as f64 };
    ctf / collection_len as f64
}

#[cfg_attr(
    feature = "config",
    derive(Serialize, Deserialize),
    serde(tag = "model", rename_all = "snake_case")
)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RetrievalModel {
    UnrankedBoolean,
    RankedBoolean,
    Bm25(Bm25Params),
    Indri(IndriParams),
}

impl Default for RetrievalModel {
    fn default() -> Self {
        RetrievalModel::Bm25(Bm25Params::default())
    }
}

impl RetrievalModel {
    pub fn name(&self) -> &'static str {
        match self {
            RetrievalModel::UnrankedBoolean => "unranked_boolean",
            RetrievalModel::RankedBoolean => "ranked_boolean",
            RetrievalModel::Bm25(_) => "bm25",
            RetrievalModel::Indri(_) => "indri",
        }
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, RetrievalModel::UnrankedBoolean | RetrievalModel::RankedBoolean)
    }
}

impl fmt::Display for RetrievalModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{collection_probability, Bm25Params, IndriParams, RetrievalModel};

    #[test]
    fn test_bm25_term_score() {
        let params = Bm25Params { k1: 1.2, b: 0.75, k3: 0.0 };
        let score = params.term_score(3.0, 10.0, 1000.0, 100.0, 50.0, 1.0);

        let expected = (990.5f64 / 10.5).ln() * (3.0 / 5.1);
        assert!((score - expected).abs() < 1e-9);
    }

    #[test]
    fn test_bm25_common_term_scores_zero() {
        let params = Bm25Params::default();
        assert!(params.term_score(5.0, 900.0, 1000.0, 10.0, 10.0, 1.0) == 0.0);
    }

    #[test]
    fn test_indri_term_score() {
        let params = IndriParams { mu: 2500.0, lambda: 0.4 };
        let mle = collection_probability(100, 1_000_000);

        let score = params.term_score(2.0, mle, 300.0);
        let expected = 0.6 * (2.0 + 2500.0 * 0.0001) / 2800.0 + 0.4 * 0.0001;
        assert!((score - expected).abs() < 1e-15);
    }

    #[test]
    fn test_indri_unsmoothed_empty_field() {
        let params = IndriParams { mu: 0.0, lambda: 0.4 };

        let score = params.term_score(0.0, 0.25, 0.0);
        assert!(score.is_finite());
        assert!((score - 0.1).abs() < 1e-15);
        assert!((params.term_score(1.0, 0.25, 2.0) - (0.6 * 0.5 + 0.1)).abs() < 1e-15);
    }

    #[test]
    fn test_collection_probability_floor() {
        assert!(collection_probability(0, 100) == 0.005);
        assert!(collection_probability(3, 0) == 0.0);
    }

    #[test]
    fn test_model_names() {
        assert_eq!(RetrievalModel::default().name(), "bm25");
        assert_eq!(RetrievalModel::RankedBoolean.to_string(), "ranked_boolean");
        assert!(RetrievalModel::UnrankedBoolean.is_boolean());
    }
}
