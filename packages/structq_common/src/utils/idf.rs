/// Robertson-Sparck Jones idf, floored at zero so that terms occurring
/// in more than half of the collection never contribute negatively.
#[inline(always)]
pub fn get_bm25_idf(num_docs: f64, doc_freq: f64) -> f64 {
    ((num_docs - doc_freq + 0.5) / (doc_freq + 0.5)).ln().max(0.0)
}
