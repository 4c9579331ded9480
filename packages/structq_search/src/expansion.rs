use std::cmp::Ordering;
use std::fmt;

use log::info;
use rustc_hash::FxHashMap;
use structq_common::index::IndexReader;
use structq_common::retrieval_model::collection_probability;
use structq_common::DEFAULT_FIELD;

use crate::query_tree::QueryNode;
use crate::searcher::RankedDoc;

#[derive(Clone, Debug, PartialEq)]
pub struct ExpansionTerm {
    pub term: String,
    pub score: f64,
}

/// Terms selected by pseudo relevance feedback, in ascending score order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Expansion {
    pub field: String,
    pub terms: Vec<ExpansionTerm>,
}

impl Expansion {
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// The expansion as a `#WAND` over its terms, weighted by their scores.
    ///
    /// `None` when there is nothing to weigh.
    pub fn to_query_node(&self) -> Option<QueryNode> {
        if self.terms.iter().map(|t| t.score).sum::<f64>() <= 0.0 {
            return None;
        }

        Some(QueryNode::wand(
            self.terms
                .iter()
                .map(|t| (t.score, QueryNode::score(QueryNode::field_term(&t.term, &self.field))))
                .collect(),
        ))
    }
}

impl fmt::Display for Expansion {
    /// `#WAND (0.1234 lowest 0.5678 highest)`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("#WAND (")?;
        for (idx, term) in self.terms.iter().enumerate() {
            if idx > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{:.4} {}", term.score, term.term)?;
        }
        f.write_str(")")
    }
}

/// Pseudo relevance feedback over the top documents of a ranking.
pub struct QueryExpansion {
    fb_docs: usize,
    fb_terms: usize,
    fb_mu: f64,
    field: String,
}

impl QueryExpansion {
    pub fn new(fb_docs: usize, fb_terms: usize, fb_mu: f64) -> Self {
        QueryExpansion { fb_docs, fb_terms, fb_mu, field: DEFAULT_FIELD.to_owned() }
    }

    pub fn with_field(mut self, field: &str) -> Self {
        self.field = field.to_owned();
        self
    }

    /// Scores every term of the top `fb_docs` documents and keeps the best `fb_terms`.
    pub fn expand(&self, index: &dyn IndexReader, ranking: &[RankedDoc]) -> Expansion {
        let feedback_docs: Vec<(&RankedDoc, f64)> = ranking
            .iter()
            .take(self.fb_docs)
            .map(|doc| {
                let doc_len = index.doc_length(&self.field, doc.doc_id) as f64;
                (doc, doc.score / (doc_len + self.fb_mu))
            })
            .collect();
        let doc_const_sum: f64 = feedback_docs.iter().map(|(_, doc_const)| doc_const).sum();

        let collection_len = index.sum_total_term_freq(&self.field);

        let mut term_scores: FxHashMap<String, f64> = FxHashMap::default();
        for &(doc, doc_const) in feedback_docs.iter() {
            let term_vector = match index.term_vector(doc.doc_id, &self.field) {
                Some(tv) => tv,
                None => continue,
            };

            for stats in term_vector.stems() {
                if stats.term.chars().any(|c| c.is_ascii_punctuation()) {
                    continue;
                }

                let mle = collection_probability(stats.ctf, collection_len);
                if mle <= 0.0 {
                    continue;
                }
                let idf = (1.0 / mle).ln();

                // Smoothing mass over all feedback documents, counted once per term
                let fb_mu = self.fb_mu;
                let score = term_scores
                    .entry(stats.term.clone())
                    .or_insert_with(|| fb_mu * mle * doc_const_sum * idf);
                *score += stats.freq as f64 * doc_const * idf;
            }
        }

        let mut terms: Vec<ExpansionTerm> = term_scores
            .into_iter()
            .map(|(term, score)| ExpansionTerm { term, score })
            .collect();
        terms.sort_by(|a, b| {
            b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal).then_with(|| a.term.cmp(&b.term))
        });
        terms.truncate(self.fb_terms);
        terms.reverse();

        info!("Expanded with {} terms from {} documents", terms.len(), feedback_docs.len());

        Expansion { field: self.field.clone(), terms }
    }

    /// `#WAND(orig_weight original, 1 - orig_weight expansion)`.
    /// The original query is returned as is when the expansion is empty.
    pub fn combine(original: QueryNode, expansion: &Expansion, orig_weight: f64) -> QueryNode {
        match expansion.to_query_node() {
            Some(expansion_node) => {
                QueryNode::wand(vec![(orig_weight, original), (1.0 - orig_weight, expansion_node)])
            }
            None => original,
        }
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use structq_common::memory_index::MemoryIndex;

    use super::{Expansion, ExpansionTerm, QueryExpansion};
    use crate::query_tree::QueryNode;
    use crate::searcher::RankedDoc;

    fn ranked(external_id: &str, doc_id: u32, score: f64) -> RankedDoc {
        RankedDoc { external_id: external_id.to_owned(), score, doc_id }
    }

    fn feedback_index() -> MemoryIndex {
        let mut index = MemoryIndex::new();
        index.add_document("d0", &[("body", "apple pie apple")]);
        index.add_document("d1", &[("body", "apple tart u.s")]);
        index.add_document("d2", &[("body", "cherry")]);
        index
    }

    #[test]
    fn test_expand() {
        let index = feedback_index();
        let ranking = vec![ranked("d0", 0, 0.6), ranked("d1", 1, 0.3), ranked("d2", 2, 0.1)];

        let expansion = QueryExpansion::new(2, 2, 2.0).expand(&index, &ranking);

        assert_eq!(expansion.terms.iter().map(|t| t.term.as_str()).collect::<Vec<_>>(), vec!["pie", "apple"]);
        assert_eq!(expansion.to_string(), "#WAND (0.3336 pie 0.3849 apple)");
    }

    #[test]
    fn test_expand_without_feedback_documents() {
        let index = feedback_index();

        let expansion = QueryExpansion::new(10, 10, 0.0).expand(&index, &[]);
        assert!(expansion.is_empty());
        assert_eq!(expansion.to_string(), "#WAND ()");
        assert_eq!(expansion.to_query_node(), None);

        let original = QueryNode::And(vec![QueryNode::term("apple")]);
        assert_eq!(QueryExpansion::combine(original.clone(), &expansion, 0.5), original);
    }

    #[test]
    fn test_combine() {
        let expansion = Expansion {
            field: "body".to_owned(),
            terms: vec![ExpansionTerm { term: "pie".to_owned(), score: 0.25 }],
        };
        let original = QueryNode::term("apple");

        let combined = QueryExpansion::combine(original.clone(), &expansion, 0.7);
        let expected = QueryNode::wand(vec![
            (0.7, original),
            (1.0 - 0.7, QueryNode::wand(vec![(0.25, QueryNode::score(QueryNode::term("pie")))])),
        ]);
        assert_eq!(combined, expected);
    }
}
