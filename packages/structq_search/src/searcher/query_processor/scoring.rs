use structq_common::index::IndexReader;
use structq_common::postings_list::InvList;
use structq_common::retrieval_model::{collection_probability, IndriParams, RetrievalModel};

use crate::query_tree::WeightKind;
use crate::score_list::ScoreList;
use crate::searcher::Searcher;

/// Score a node gives to documents absent from its score list.
///
/// Built alongside the scores during evaluation and dropped with them,
/// so nothing is ever stored on the query tree.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum DefaultScorer {
    Zero,
    /// Language model probability of an unseen term
    Term { field: String, mle: f64, params: IndriParams },
    /// `weights` are already normalized
    Combined { kind: WeightKind, weights: Vec<f64>, children: Vec<DefaultScorer> },
}

impl DefaultScorer {
    pub(crate) fn score(&self, index: &dyn IndexReader, doc_id: u32) -> f64 {
        match self {
            DefaultScorer::Zero => 0.0,
            DefaultScorer::Term { field, mle, params } => {
                params.term_score(0.0, *mle, index.doc_length(field, doc_id) as f64)
            }
            DefaultScorer::Combined { kind, weights, children } => children
                .iter()
                .zip(weights.iter())
                .fold(kind.identity(), |acc, (child, &weight)| {
                    kind.combine(acc, child.score(index, doc_id), weight)
                }),
        }
    }
}

/// Output of a scoring operator
pub(crate) struct Scored {
    pub(crate) scores: ScoreList,
    pub(crate) defaults: DefaultScorer,
}

impl Scored {
    pub(crate) fn without_defaults(scores: ScoreList) -> Self {
        Scored { scores, defaults: DefaultScorer::Zero }
    }
}

impl<'a> Searcher<'a> {
    /// The SCORE operator: turns an inverted list into document scores
    /// under the active retrieval model.
    pub(crate) fn score_postings(&self, list: &InvList) -> Scored {
        let mut scores = ScoreList::with_capacity(list.df());

        match self.model {
            RetrievalModel::UnrankedBoolean => {
                for posting in list.postings.iter() {
                    scores.add(posting.doc_id, 1.0);
                }
            }
            RetrievalModel::RankedBoolean => {
                for posting in list.postings.iter() {
                    scores.add(posting.doc_id, posting.tf() as f64);
                }
            }
            RetrievalModel::Bm25(params) => {
                let num_docs = self.index.num_docs() as f64;
                let avg_doc_len = self.index.avg_doc_length(&list.field);
                let df = list.df() as f64;

                for posting in list.postings.iter() {
                    let doc_len = self.index.doc_length(&list.field, posting.doc_id) as f64;
                    scores.add(
                        posting.doc_id,
                        params.term_score(posting.tf() as f64, df, num_docs, doc_len, avg_doc_len, 1.0),
                    );
                }
            }
            RetrievalModel::Indri(params) => {
                let mle = self.collection_mle(list);

                for posting in list.postings.iter() {
                    let doc_len = self.index.doc_length(&list.field, posting.doc_id) as f64;
                    scores.add(posting.doc_id, params.term_score(posting.tf() as f64, mle, doc_len));
                }
            }
        }

        Scored { scores, defaults: self.postings_default_scorer(list) }
    }

    pub(crate) fn postings_default_scorer(&self, list: &InvList) -> DefaultScorer {
        match self.model {
            RetrievalModel::Indri(params) => DefaultScorer::Term {
                field: list.field.clone(),
                mle: self.collection_mle(list),
                params: *params,
            },
            _ => DefaultScorer::Zero,
        }
    }

    fn collection_mle(&self, list: &InvList) -> f64 {
        collection_probability(list.ctf, self.index.sum_total_term_freq(&list.field))
    }
}
