mod query;
mod query_processor;

use structq_common::index::IndexReader;
use structq_common::postings_list::InvList;
use structq_common::retrieval_model::RetrievalModel;

use crate::query_tree::QueryNode;
use crate::score_list::ScoreList;
use crate::QueryError;

pub use query::{sort_ranked_docs, RankedDoc, RankedDocComparator};

/// What a node evaluates to
#[derive(Clone, Debug, PartialEq)]
pub enum QueryResult {
    Postings(InvList),
    Scores(ScoreList),
}

/// Evaluation context of one query.
///
/// Borrows the index and the retrieval model for the duration of the evaluation.
/// All cursor state lives on the stack of the evaluating calls, so a single
/// `QueryNode` tree can be evaluated any number of times.
pub struct Searcher<'a> {
    index: &'a dyn IndexReader,
    model: &'a RetrievalModel,
}

impl<'a> Searcher<'a> {
    pub fn new(index: &'a dyn IndexReader, model: &'a RetrievalModel) -> Self {
        Searcher { index, model }
    }

    pub fn index(&self) -> &'a dyn IndexReader {
        self.index
    }

    pub fn model(&self) -> &'a RetrievalModel {
        self.model
    }

    /// Evaluates a node into an inverted list (TERM, SYN, NEAR, WINDOW)
    /// or a score list (everything else).
    pub fn evaluate(&self, node: &QueryNode) -> Result<QueryResult, QueryError> {
        if node.is_structural() {
            Ok(QueryResult::Postings(self.evaluate_postings(node)?))
        } else {
            Ok(QueryResult::Scores(self.evaluate_scores(node)?.scores))
        }
    }

    /// Evaluates a query root into document scores.
    /// A structural root is scored as if wrapped in `#SCORE`.
    pub fn evaluate_query(&self, node: &QueryNode) -> Result<ScoreList, QueryError> {
        Ok(self.evaluate_scores(node)?.scores)
    }

    /// Score the node assigns to a document that none of its operands matched
    pub fn default_score(&self, node: &QueryNode, doc_id: u32) -> Result<f64, QueryError> {
        Ok(self.default_scorer(node)?.score(self.index, doc_id))
    }

    /// Evaluates and ranks a query, keeping the best `limit` documents.
    pub fn search(&self, node: &QueryNode, limit: usize) -> Result<Vec<RankedDoc>, QueryError> {
        let scores = self.evaluate_query(node)?;
        Ok(self.rank(&scores, limit))
    }
}
