mod feature_file;
mod features;
mod normalize;

use std::collections::BTreeMap;
use std::path::Path;

use log::{info, warn};
use rustc_hash::FxHashMap;
use structq_common::index::IndexReader;
use structq_common::retrieval_model::RetrievalModel;
use structq_common::tokenize::QueryTokenizer;
use structq_search::searcher::{sort_ranked_docs, RankedDoc};

pub use feature_file::{read_scored_lines, write_feature_file, FeatureLine};
pub use features::{FeatureExtractor, FeatureVector, LETOR_FIELDS, NUM_FEATURES};
pub use normalize::normalize;

use crate::config::LetorConfig;
use crate::ranker::SvmRanker;
use crate::readers::{Judgments, QueryLine};
use crate::runner::QueryRunner;
use crate::Result;

/// Builds learning-to-rank feature files and re-ranks candidates with the
/// scores the external ranker assigns them.
pub struct LetorPipeline<'a> {
    index: &'a dyn IndexReader,
    tokenizer: &'a dyn QueryTokenizer,
    config: &'a LetorConfig,
    pagerank: &'a FxHashMap<String, f64>,
}

impl<'a> LetorPipeline<'a> {
    pub fn new(
        index: &'a dyn IndexReader,
        tokenizer: &'a dyn QueryTokenizer,
        config: &'a LetorConfig,
        pagerank: &'a FxHashMap<String, f64>,
    ) -> Self {
        LetorPipeline { index, tokenizer, config, pagerank }
    }

    fn sorted_queries(queries: &[QueryLine]) -> Vec<&QueryLine> {
        let mut sorted: Vec<&QueryLine> = queries.iter().collect();
        sorted.sort_by_key(|query| query.qid);
        sorted
    }

    /// Normalized feature lines of one query's `(label, doc_id, external_id)` candidates
    fn query_lines(&self, query: &QueryLine, candidates: Vec<(i32, u32, String)>) -> Vec<FeatureLine> {
        let stems = self.tokenizer.tokenize(&query.text);
        let extractor = FeatureExtractor::new(self.index, self.config, self.pagerank);

        let mut vectors: Vec<FeatureVector> = candidates
            .iter()
            .map(|(_, doc_id, external_id)| extractor.extract(&stems, *doc_id, external_id))
            .collect();
        normalize(&mut vectors);

        candidates
            .into_iter()
            .zip(vectors.into_iter())
            .map(|((label, _, external_id), features)| FeatureLine { label, qid: query.qid, features, external_id })
            .collect()
    }

    /// Feature lines of every judged document, labelled with its relevance.
    pub fn training_features(&self, queries: &[QueryLine], judgments: &Judgments) -> Vec<FeatureLine> {
        let mut lines = Vec::new();

        for query in Self::sorted_queries(queries) {
            let judged = match judgments.get(&query.qid) {
                Some(judged) => judged,
                None => {
                    warn!("Training query {} has no relevance judgments", query.qid);
                    continue;
                }
            };

            let candidates = judged
                .iter()
                .filter_map(|judgment| match self.index.internal_id(&judgment.external_id) {
                    Some(doc_id) => Some((judgment.relevance, doc_id, judgment.external_id.clone())),
                    None => {
                        warn!("Unknown document {} judged for query {}", judgment.external_id, query.qid);
                        None
                    }
                })
                .collect();

            lines.extend(self.query_lines(query, candidates));
        }

        lines
    }

    /// Feature lines of the top BM25 candidates of every query, labelled 0.
    pub fn testing_features(&self, queries: &[QueryLine]) -> Result<Vec<FeatureLine>> {
        let runner = QueryRunner::new(
            self.index,
            self.tokenizer,
            RetrievalModel::Bm25(self.config.bm25),
            self.config.max_candidates,
        );

        let mut lines = Vec::new();
        for query in Self::sorted_queries(queries) {
            let candidates = runner
                .run_text(&query.text)?
                .into_iter()
                .map(|doc| (0, doc.doc_id, doc.external_id))
                .collect();

            lines.extend(self.query_lines(query, candidates));
        }

        Ok(lines)
    }

    /// Writes the training feature file and trains the ranker model on it.
    pub fn train(
        &self,
        queries: &[QueryLine],
        judgments: &Judgments,
        feature_path: &Path,
        ranker: &SvmRanker,
    ) -> Result<()> {
        let lines = self.training_features(queries, judgments);
        write_feature_file(feature_path, &lines)?;
        info!("Wrote {} training feature lines to {}", lines.len(), feature_path.display());

        ranker.train(feature_path, &self.config.model_file)
    }

    /// Writes the testing feature file, classifies it and re-ranks each
    /// query's candidates by the ranker's scores.
    pub fn rank(
        &self,
        queries: &[QueryLine],
        feature_path: &Path,
        scores_path: &Path,
        ranker: &SvmRanker,
    ) -> Result<BTreeMap<u32, Vec<RankedDoc>>> {
        let lines = self.testing_features(queries)?;
        write_feature_file(feature_path, &lines)?;
        info!("Wrote {} testing feature lines to {}", lines.len(), feature_path.display());

        ranker.classify(feature_path, &self.config.model_file, scores_path)?;
        self.rerank(feature_path, scores_path)
    }

    /// Orders the documents of a feature file by the matching lines of a score file.
    pub fn rerank(&self, feature_path: &Path, scores_path: &Path) -> Result<BTreeMap<u32, Vec<RankedDoc>>> {
        let mut rankings = BTreeMap::new();

        for (qid, scored) in read_scored_lines(feature_path, scores_path)? {
            let mut ranking: Vec<RankedDoc> = scored
                .into_iter()
                .filter_map(|(external_id, score)| match self.index.internal_id(&external_id) {
                    Some(doc_id) => Some(RankedDoc { external_id, score, doc_id }),
                    None => {
                        warn!("Unknown document {} in the feature file", external_id);
                        None
                    }
                })
                .collect();
            sort_ranked_docs(&mut ranking);

            rankings.insert(qid, ranking);
        }

        Ok(rankings)
    }
}
