use crate::postings_list::InvList;
use crate::term_vector::TermVector;

/// Read access to an inverted index.
///
/// Internal doc ids are dense, starting from 0. Every statistic is scoped
/// to a field, since lengths and frequencies differ between fields.
pub trait IndexReader {
    /// Postings of `term` in `field`, ascending by doc id. Unknown terms yield an empty list.
    fn inverted_list(&self, term: &str, field: &str) -> InvList;

    /// `None` when the document has no content in `field`
    fn term_vector(&self, doc_id: u32, field: &str) -> Option<TermVector>;

    fn doc_length(&self, field: &str, doc_id: u32) -> u64;

    /// Total number of term occurrences in `field` over the collection
    fn sum_total_term_freq(&self, field: &str) -> u64;

    /// Number of documents that have `field`
    fn doc_count(&self, field: &str) -> u32;

    fn num_docs(&self) -> u32;

    fn total_term_freq(&self, term: &str, field: &str) -> u64;

    fn external_id(&self, doc_id: u32) -> Option<String>;

    fn internal_id(&self, external_id: &str) -> Option<u32>;

    fn doc_attribute(&self, doc_id: u32, name: &str) -> Option<String>;

    fn avg_doc_length(&self, field: &str) -> f64 {
        let doc_count = self.doc_count(field);
        if doc_count == 0 {
            return 0.0;
        }
        self.sum_total_term_freq(field) as f64 / doc_count as f64
    }
}
