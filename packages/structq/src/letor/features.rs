use rustc_hash::FxHashMap;
use structq_common::index::IndexReader;
use structq_common::retrieval_model::{collection_probability, Bm25Params, IndriParams};
use structq_common::term_vector::TermVector;
use structq_common::utils::idf::get_bm25_idf;

use crate::config::LetorConfig;

pub const NUM_FEATURES: usize = 18;

/// Fields with per-field features, in feature number order
pub static LETOR_FIELDS: [&str; 4] = ["body", "title", "url", "inlink"];

/// Sparse feature values, numbered from 1.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeatureVector {
    values: [Option<f64>; NUM_FEATURES],
}

impl FeatureVector {
    pub fn get(&self, feature: usize) -> Option<f64> {
        self.values.get(feature.wrapping_sub(1)).copied().flatten()
    }

    pub fn set(&mut self, feature: usize, value: f64) {
        debug_assert!(feature >= 1 && feature <= NUM_FEATURES);
        if let Some(slot) = self.values.get_mut(feature.wrapping_sub(1)) {
            *slot = Some(value);
        }
    }

    pub fn clear(&mut self, feature: usize) {
        if let Some(slot) = self.values.get_mut(feature.wrapping_sub(1)) {
            *slot = None;
        }
    }

    /// Present features in ascending feature number order
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(idx, value)| value.map(|value| (idx + 1, value)))
    }
}

/// Query-dependent features of one document field.
struct FieldScorer<'a> {
    index: &'a dyn IndexReader,
    field: &'a str,
    term_vector: &'a TermVector,
    stems: &'a [String],
    doc_len: f64,
}

impl<'a> FieldScorer<'a> {
    fn bm25(&self, params: &Bm25Params) -> f64 {
        let num_docs = self.index.num_docs() as f64;
        let avg_doc_len = self.index.avg_doc_length(self.field);

        self.stems
            .iter()
            .filter_map(|stem| self.term_vector.get(stem))
            .map(|stats| {
                params.term_score(stats.freq as f64, stats.df as f64, num_docs, self.doc_len, avg_doc_len, 1.0)
            })
            .sum()
    }

    /// Geometric mean of the per-stem language model scores.
    /// 0 when none of the stems occur in the field.
    fn indri(&self, params: &IndriParams) -> f64 {
        if self.stems.iter().all(|stem| self.term_vector.get(stem).is_none()) {
            return 0.0;
        }

        let collection_len = self.index.sum_total_term_freq(self.field);
        let exponent = 1.0 / self.stems.len() as f64;

        self.stems.iter().fold(1.0, |acc, stem| {
            let (tf, ctf) = match self.term_vector.get(stem) {
                Some(stats) => (stats.freq as f64, stats.ctf),
                None => (0.0, self.index.total_term_freq(stem, self.field)),
            };
            let mle = collection_probability(ctf, collection_len);
            acc * params.term_score(tf, mle, self.doc_len).powf(exponent)
        })
    }

    /// Fraction of the stems occurring in the field
    fn overlap(&self) -> f64 {
        if self.stems.is_empty() {
            return 0.0;
        }

        let matched = self.stems.iter().filter(|stem| self.term_vector.get(stem).is_some()).count();
        matched as f64 / self.stems.len() as f64
    }

    fn tf_idf(&self) -> f64 {
        let num_docs = self.index.num_docs() as f64;

        self.stems
            .iter()
            .filter_map(|stem| self.term_vector.get(stem))
            .map(|stats| stats.freq as f64 * get_bm25_idf(num_docs, stats.df as f64))
            .sum()
    }

    fn boolean_and(&self) -> f64 {
        if !self.stems.is_empty() && self.stems.iter().all(|stem| self.term_vector.get(stem).is_some()) {
            1.0
        } else {
            0.0
        }
    }
}

/// Computes raw, unnormalized feature vectors of (query, document) pairs.
pub struct FeatureExtractor<'a> {
    index: &'a dyn IndexReader,
    config: &'a LetorConfig,
    pagerank: &'a FxHashMap<String, f64>,
}

impl<'a> FeatureExtractor<'a> {
    pub fn new(index: &'a dyn IndexReader, config: &'a LetorConfig, pagerank: &'a FxHashMap<String, f64>) -> Self {
        FeatureExtractor { index, config, pagerank }
    }

    /// Feature numbers:
    ///
    /// 1. spam score, the `score` document attribute
    /// 2. url depth, the number of `/` in the `rawUrl` attribute
    /// 3. whether `rawUrl` is in the trusted domain
    /// 4. pagerank
    /// 5. to 16. BM25, Indri and term overlap for body, title, url and inlink, in that order
    /// 17. tf-idf over body
    /// 18. whether body contains every stem
    ///
    /// Features of a field the document does not have are left out, as are disabled features.
    pub fn extract(&self, stems: &[String], doc_id: u32, external_id: &str) -> FeatureVector {
        let mut features = FeatureVector::default();

        if let Some(spam_score) = self
            .index
            .doc_attribute(doc_id, "score")
            .and_then(|raw| raw.trim().parse::<f64>().ok())
        {
            features.set(1, spam_score);
        }

        let raw_url = self.index.doc_attribute(doc_id, "rawUrl").unwrap_or_default();
        features.set(2, raw_url.matches('/').count() as f64);
        features.set(3, if raw_url.contains(self.config.trusted_domain.as_str()) { 1.0 } else { 0.0 });

        if let Some(&pagerank) = self.pagerank.get(external_id) {
            features.set(4, pagerank);
        }

        for (field_idx, &field) in LETOR_FIELDS.iter().enumerate() {
            let term_vector = match self.index.term_vector(doc_id, field) {
                Some(term_vector) => term_vector,
                None => continue,
            };

            let scorer = FieldScorer {
                index: self.index,
                field,
                term_vector: &term_vector,
                stems,
                doc_len: self.index.doc_length(field, doc_id) as f64,
            };

            let base = 5 + 3 * field_idx;
            features.set(base, scorer.bm25(&self.config.bm25));
            features.set(base + 1, scorer.indri(&self.config.indri));
            features.set(base + 2, scorer.overlap());

            if field_idx == 0 {
                features.set(17, scorer.tf_idf());
                features.set(18, scorer.boolean_and());
            }
        }

        for &feature in self.config.feature_disable.iter() {
            features.clear(feature);
        }

        features
    }
}
