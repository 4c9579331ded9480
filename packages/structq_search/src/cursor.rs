use structq_common::postings_list::Posting;

use crate::score_list::DocScore;
use crate::QueryError;

/// Anything a cursor can walk over: entries keyed by an ascending doc id.
pub trait DocEntry {
    fn doc_id(&self) -> u32;
}

impl DocEntry for Posting {
    #[inline(always)]
    fn doc_id(&self) -> u32 {
        self.doc_id
    }
}

impl DocEntry for DocScore {
    #[inline(always)]
    fn doc_id(&self) -> u32 {
        self.doc_id
    }
}

/// Forward-only read pointer over a doc id sorted sequence.
///
/// The index never decreases, which is what keeps the merge loops linear.
/// Cursors borrow the operand results and live for exactly one operator evaluation.
pub struct Cursor<'a, T: DocEntry> {
    entries: &'a [T],
    idx: usize,
}

impl<'a, T: DocEntry> Cursor<'a, T> {
    pub fn new(entries: &'a [T]) -> Self {
        Cursor { entries, idx: 0 }
    }

    #[inline(always)]
    pub fn is_exhausted(&self) -> bool {
        self.idx >= self.entries.len()
    }

    /// The entry under the cursor. The reference outlives the cursor borrow.
    #[inline(always)]
    pub fn current(&self) -> Option<&'a T> {
        self.entries.get(self.idx)
    }

    pub fn current_doc_id(&self) -> Result<u32, QueryError> {
        self.current().map(|entry| entry.doc_id()).ok_or(QueryError::Exhausted)
    }

    #[inline(always)]
    pub fn advance(&mut self) {
        if self.idx < self.entries.len() {
            self.idx += 1;
        }
    }

    /// Skips entries whose doc id is below `target`, stopping at the first
    /// entry with a doc id of at least `target` or at the end.
    pub fn advance_to(&mut self, target: u32) {
        while let Some(entry) = self.entries.get(self.idx) {
            if entry.doc_id() >= target {
                break;
            }
            self.idx += 1;
        }
    }

    /// Returns the current entry if it is exactly `doc_id`, moving past it.
    pub fn take_if_at(&mut self, doc_id: u32) -> Option<&'a T> {
        match self.current() {
            Some(entry) if entry.doc_id() == doc_id => {
                self.idx += 1;
                Some(entry)
            }
            _ => None,
        }
    }
}

/// Smallest current doc id over a set of cursors, `None` once all are exhausted.
pub fn min_doc_id<T: DocEntry>(cursors: &[Cursor<T>]) -> Option<u32> {
    cursors.iter().filter_map(|c| c.current()).map(|entry| entry.doc_id()).min()
}
