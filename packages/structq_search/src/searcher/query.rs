use std::cmp::Ordering;

use binary_heap_plus::BinaryHeap;
use log::warn;

use crate::score_list::ScoreList;
use crate::searcher::Searcher;

#[derive(Clone, Debug, PartialEq)]
pub struct RankedDoc {
    pub external_id: String,
    pub score: f64,
    pub doc_id: u32,
}

pub type RankedDocComparator = dyn Fn(&RankedDoc, &RankedDoc) -> Ordering;

// Higher scores first, then ascending external ids
fn compare_ranked_docs(a: &RankedDoc, b: &RankedDoc) -> Ordering {
    a.score
        .partial_cmp(&b.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| b.external_id.cmp(&a.external_id))
}

/// Sorts already scored documents into ranking order.
pub fn sort_ranked_docs(docs: &mut [RankedDoc]) {
    docs.sort_by(|a, b| compare_ranked_docs(b, a));
}

impl<'a> Searcher<'a> {
    /// Orders a score list by descending score, breaking ties by ascending
    /// external id, and keeps at most `limit` documents.
    pub fn rank(&self, scores: &ScoreList, limit: usize) -> Vec<RankedDoc> {
        let mut docs = Vec::with_capacity(scores.len());
        for entry in scores.scores.iter() {
            match self.index.external_id(entry.doc_id) {
                Some(external_id) => docs.push(RankedDoc {
                    external_id,
                    score: entry.score,
                    doc_id: entry.doc_id,
                }),
                None => warn!("Document {} has no external id, leaving it out of the ranking", entry.doc_id),
            }
        }

        let comparator: Box<RankedDocComparator> = Box::new(compare_ranked_docs);
        let mut result_heap = BinaryHeap::from_vec_cmp(docs, comparator);

        let mut ranked = Vec::with_capacity(limit.min(result_heap.len()));
        while ranked.len() < limit {
            match result_heap.pop() {
                Some(doc) => ranked.push(doc),
                None => break,
            }
        }

        ranked
    }
}
