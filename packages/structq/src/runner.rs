use std::collections::BTreeMap;

use log::{info, warn};
use structq_common::index::IndexReader;
use structq_common::retrieval_model::RetrievalModel;
use structq_common::tokenize::QueryTokenizer;
use structq_common::DEFAULT_FIELD;
use structq_search::expansion::{Expansion, QueryExpansion};
use structq_search::searcher::{sort_ranked_docs, RankedDoc};
use structq_search::{QueryNode, Searcher};

use crate::config::{FeedbackConfig, StructqConfig};
use crate::readers::{read_initial_rankings, InitialRankings, QueryLine};
use crate::{Error, Result};

/// Fields a query term may name with a `term.field` suffix
pub static QUERY_FIELDS: [&str; 5] = ["body", "title", "url", "inlink", "keywords"];

/// Result of a feedback run
#[derive(Debug)]
pub struct FeedbackRun {
    pub ranking: Vec<RankedDoc>,
    pub expansion: Expansion,
}

/// Runs bag-of-words queries against an index under one retrieval model.
pub struct QueryRunner<'a> {
    index: &'a dyn IndexReader,
    tokenizer: &'a dyn QueryTokenizer,
    model: RetrievalModel,
    max_results: usize,
}

impl<'a> QueryRunner<'a> {
    pub fn new(
        index: &'a dyn IndexReader,
        tokenizer: &'a dyn QueryTokenizer,
        model: RetrievalModel,
        max_results: usize,
    ) -> Self {
        QueryRunner { index, tokenizer, model, max_results }
    }

    pub fn from_config(index: &'a dyn IndexReader, tokenizer: &'a dyn QueryTokenizer, config: &StructqConfig) -> Self {
        QueryRunner::new(index, tokenizer, config.retrieval_model, config.max_results)
    }

    pub fn model(&self) -> &RetrievalModel {
        &self.model
    }

    /// Combines the query's terms with the model's default operator:
    /// `#OR` for the boolean models, `#SUM` for BM25 and `#AND` for Indri.
    ///
    /// Returns `None` if nothing is left after tokenization.
    pub fn build_query(&self, text: &str) -> Option<QueryNode> {
        let mut terms = Vec::new();

        for raw in text.split_whitespace() {
            let (raw_term, field) = match raw.rsplit_once('.') {
                Some((term, field)) if QUERY_FIELDS.contains(&field.to_ascii_lowercase().as_str()) => {
                    (term, field.to_ascii_lowercase())
                }
                _ => (raw, DEFAULT_FIELD.to_owned()),
            };

            for stem in self.tokenizer.tokenize(raw_term) {
                terms.push(QueryNode::field_term(&stem, &field));
            }
        }

        if terms.is_empty() {
            return None;
        }

        Some(match self.model {
            RetrievalModel::UnrankedBoolean | RetrievalModel::RankedBoolean => QueryNode::Or(terms),
            RetrievalModel::Bm25(_) => QueryNode::Sum(terms),
            RetrievalModel::Indri(_) => QueryNode::And(terms),
        })
    }

    pub fn run(&self, query: &QueryNode) -> Result<Vec<RankedDoc>> {
        let ranking = Searcher::new(self.index, &self.model).search(query, self.max_results)?;
        info!("{} returned {} documents", query, ranking.len());
        Ok(ranking)
    }

    /// Runs query text, an empty query ranks nothing
    pub fn run_text(&self, text: &str) -> Result<Vec<RankedDoc>> {
        match self.build_query(text) {
            Some(query) => self.run(&query),
            None => {
                warn!("Query `{}` has no terms left after tokenization", text);
                Ok(Vec::new())
            }
        }
    }

    /// Expands the query from the top of an initial ranking, then reruns the
    /// original and expansion queries combined with `#WAND`.
    ///
    /// Without an `initial_ranking` the query itself is run first.
    pub fn run_with_feedback(
        &self,
        query: &QueryNode,
        feedback: &FeedbackConfig,
        initial_ranking: Option<&[RankedDoc]>,
    ) -> Result<FeedbackRun> {
        if !matches!(self.model, RetrievalModel::Indri(_)) {
            return Err(Error::Config(format!(
                "query expansion needs the indri retrieval model, not {}",
                self.model,
            )));
        }

        let ranking = match initial_ranking {
            Some(ranking) => ranking.to_vec(),
            None => self.run(query)?,
        };

        let expansion = QueryExpansion::new(feedback.fb_docs, feedback.fb_terms, feedback.fb_mu)
            .with_field(&feedback.field)
            .expand(self.index, &ranking);
        info!("Expansion query {}", expansion);

        let combined = QueryExpansion::combine(query.clone(), &expansion, feedback.fb_orig_weight);

        Ok(FeedbackRun { ranking: self.run(&combined)?, expansion })
    }

    /// Maps an external ranking onto internal doc ids, dropping unknown documents.
    pub fn resolve_ranking(&self, entries: &[(String, f64)]) -> Vec<RankedDoc> {
        let mut ranking: Vec<RankedDoc> = entries
            .iter()
            .filter_map(|(external_id, score)| match self.index.internal_id(external_id) {
                Some(doc_id) => Some(RankedDoc { external_id: external_id.clone(), score: *score, doc_id }),
                None => {
                    warn!("Unknown document {} in the initial ranking", external_id);
                    None
                }
            })
            .collect();

        sort_ranked_docs(&mut ranking);
        ranking
    }

    /// Runs every query in ascending query id order, with pseudo relevance
    /// feedback when `feedback.enabled` is set.
    ///
    /// Feedback starts from the `initial_ranking_file` rankings if one is
    /// configured, otherwise from a run of the query itself.
    pub fn run_queries(
        &self,
        queries: &[QueryLine],
        feedback: &FeedbackConfig,
    ) -> Result<BTreeMap<u32, Vec<RankedDoc>>> {
        let initial_rankings: InitialRankings = match &feedback.initial_ranking_file {
            Some(path) if feedback.enabled => read_initial_rankings(path)?,
            _ => InitialRankings::new(),
        };

        let mut sorted: Vec<&QueryLine> = queries.iter().collect();
        sorted.sort_by_key(|query| query.qid);

        let mut rankings = BTreeMap::new();
        for query_line in sorted {
            let query = match self.build_query(&query_line.text) {
                Some(query) => query,
                None => {
                    warn!("Query {} has no terms left after tokenization", query_line.qid);
                    rankings.insert(query_line.qid, Vec::new());
                    continue;
                }
            };

            let ranking = if feedback.enabled {
                let initial = initial_rankings.get(&query_line.qid).map(|entries| self.resolve_ranking(entries));
                self.run_with_feedback(&query, feedback, initial.as_deref())?.ranking
            } else {
                self.run(&query)?
            };

            rankings.insert(query_line.qid, ranking);
        }

        info!("Evaluated {} queries", rankings.len());
        Ok(rankings)
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use structq_common::memory_index::MemoryIndex;
    use structq_common::retrieval_model::{Bm25Params, IndriParams, RetrievalModel};
    use structq_common::tokenize::AsciiTokenizer;
    use structq_search::QueryNode;

    use super::QueryRunner;
    use crate::config::{FeedbackConfig, StructqConfig};
    use crate::readers::QueryLine;
    use crate::Error;

    fn sample_index() -> MemoryIndex {
        let mut index = MemoryIndex::new();
        index.add_document("d0", &[("body", "apple pie apple tart"), ("title", "apple pie")]);
        index.add_document("d1", &[("body", "banana pie crust"), ("title", "banana")]);
        index.add_document("d2", &[("body", "apple banana split"), ("title", "split")]);
        index.add_document("d3", &[("body", "cherry tart crust"), ("title", "cherry tart")]);
        index
    }

    #[test]
    fn test_build_query() {
        let index = sample_index();
        let tokenizer = AsciiTokenizer::default();

        let runner = QueryRunner::new(&index, &tokenizer, RetrievalModel::Indri(IndriParams::default()), 10);
        assert_eq!(
            runner.build_query("The Apple pie.title u.s"),
            Some(QueryNode::And(vec![
                QueryNode::term("apple"),
                QueryNode::field_term("pie", "title"),
                QueryNode::term("u"),
                QueryNode::term("s"),
            ])),
        );
        assert_eq!(runner.build_query("the of"), None);

        let runner = QueryRunner::new(&index, &tokenizer, RetrievalModel::UnrankedBoolean, 10);
        assert!(matches!(runner.build_query("apple"), Some(QueryNode::Or(_))));

        let runner = QueryRunner::new(&index, &tokenizer, RetrievalModel::Bm25(Bm25Params::default()), 10);
        assert!(matches!(runner.build_query("apple"), Some(QueryNode::Sum(_))));
    }

    #[test]
    fn test_run_text() {
        let index = sample_index();
        let tokenizer = AsciiTokenizer::default();
        let runner = QueryRunner::new(&index, &tokenizer, RetrievalModel::RankedBoolean, 2);

        let ranking = runner.run_text("apple tart").unwrap();
        assert_eq!(ranking.iter().map(|d| d.external_id.as_str()).collect::<Vec<_>>(), vec!["d0", "d2"]);
        assert_eq!(ranking[0].score, 2.0);

        assert!(runner.run_text("the").unwrap().is_empty());
    }

    #[test]
    fn test_feedback_requires_indri() {
        let index = sample_index();
        let tokenizer = AsciiTokenizer::default();
        let runner = QueryRunner::new(&index, &tokenizer, RetrievalModel::RankedBoolean, 10);

        let result = runner.run_with_feedback(&QueryNode::term("apple"), &FeedbackConfig::default(), None);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_run_with_feedback() {
        let index = sample_index();
        let tokenizer = AsciiTokenizer::default();
        let runner = QueryRunner::new(&index, &tokenizer, RetrievalModel::Indri(IndriParams::default()), 10);

        let feedback = FeedbackConfig { fb_docs: 2, fb_terms: 3, ..FeedbackConfig::default() };
        let query = runner.build_query("apple").unwrap();
        let run = runner.run_with_feedback(&query, &feedback, None).unwrap();

        assert_eq!(run.expansion.terms.len(), 3);
        assert!(run.expansion.to_string().starts_with("#WAND ("));
        // Expansion terms pull in documents without the original term
        assert!(run.ranking.iter().any(|d| d.external_id == "d1" || d.external_id == "d3"));
        assert!(run.ranking.windows(2).all(|pair| pair[0].score >= pair[1].score));
    }

    #[test]
    fn test_resolve_ranking() {
        let index = sample_index();
        let tokenizer = AsciiTokenizer::default();
        let runner = QueryRunner::new(&index, &tokenizer, RetrievalModel::Indri(IndriParams::default()), 10);

        let ranking = runner.resolve_ranking(&[
            ("d2".to_owned(), 0.2),
            ("unknown".to_owned(), 0.9),
            ("d1".to_owned(), 0.7),
        ]);
        assert_eq!(
            ranking.iter().map(|d| (d.external_id.as_str(), d.doc_id)).collect::<Vec<_>>(),
            vec![("d1", 1), ("d2", 2)],
        );
    }

    #[test]
    fn test_run_queries() {
        let index = sample_index();
        let tokenizer = AsciiTokenizer::default();
        let runner = QueryRunner::new(&index, &tokenizer, RetrievalModel::Indri(IndriParams::default()), 10);

        let queries = vec![
            QueryLine { qid: 9, text: "cherry".to_owned() },
            QueryLine { qid: 4, text: "the".to_owned() },
        ];
        let rankings = runner.run_queries(&queries, &FeedbackConfig::default()).unwrap();

        assert_eq!(rankings.keys().copied().collect::<Vec<_>>(), vec![4, 9]);
        assert!(rankings[&4].is_empty());
        assert_eq!(rankings[&9].iter().map(|d| d.external_id.as_str()).collect::<Vec<_>>(), vec!["d3"]);
    }

    #[test]
    fn test_run_queries_from_initial_ranking() {
        let index = sample_index();
        let tokenizer = AsciiTokenizer::default();
        let runner = QueryRunner::new(&index, &tokenizer, RetrievalModel::Indri(IndriParams::default()), 10);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("initial.teIn");
        std::fs::write(&path, "1 Q0 d1 1 0.9 run\n1 Q0 unknown 2 0.5 run\n").unwrap();

        let feedback = FeedbackConfig {
            enabled: true,
            fb_docs: 1,
            fb_terms: 2,
            initial_ranking_file: Some(path),
            ..FeedbackConfig::default()
        };
        let queries = vec![QueryLine { qid: 1, text: "cherry".to_owned() }];
        let rankings = runner.run_queries(&queries, &feedback).unwrap();

        // The expansion comes from d1, which does not contain the query term
        assert!(rankings[&1].iter().any(|d| d.external_id == "d1"));
    }

    #[test]
    fn test_stemmed_queries_match_stemmed_index() {
        let mut index = MemoryIndex::new();
        index.add_document("d0", &[("body", "cat run fast")]);
        index.add_document("d1", &[("body", "dog sleep")]);

        let config = StructqConfig::from_json(r#"{ "retrieval_model": { "model": "indri" }, "stemmer": "english" }"#)
            .unwrap();
        let tokenizer = config.tokenizer();
        let runner = QueryRunner::from_config(&index, &tokenizer, &config);

        let ranking = runner.run_text("Running cats").unwrap();
        assert_eq!(ranking.iter().map(|d| d.external_id.as_str()).collect::<Vec<_>>(), vec!["d0"]);
    }
}
