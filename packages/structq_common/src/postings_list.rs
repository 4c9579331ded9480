/// One document's entry in an inverted list.
///
/// Positions are strictly ascending; the term frequency is the number of positions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Posting {
    pub doc_id: u32,
    pub positions: Vec<u32>,
}

impl Posting {
    pub fn new(doc_id: u32, positions: Vec<u32>) -> Self {
        Posting { doc_id, positions }
    }

    #[inline(always)]
    pub fn tf(&self) -> u32 {
        self.positions.len() as u32
    }

    /// Position-level union of two postings of the same document.
    /// Positions present in both are kept once.
    pub fn merge(posting_1: &Posting, posting_2: &Posting) -> Posting {
        debug_assert!(posting_1.doc_id == posting_2.doc_id);

        let mut positions = Vec::with_capacity(posting_1.positions.len() + posting_2.positions.len());

        let mut pos2_idx = 0;
        for &pos1 in posting_1.positions.iter() {
            while pos2_idx < posting_2.positions.len() && posting_2.positions[pos2_idx] < pos1 {
                positions.push(posting_2.positions[pos2_idx]);
                pos2_idx += 1;
            }

            if pos2_idx < posting_2.positions.len() && posting_2.positions[pos2_idx] == pos1 {
                pos2_idx += 1;
            }

            positions.push(pos1);
        }

        positions.extend_from_slice(&posting_2.positions[pos2_idx..]);

        Posting { doc_id: posting_1.doc_id, positions }
    }
}

/// Postings of a term (or of a derived structural expression) within one field.
#[derive(Clone, Debug, PartialEq)]
pub struct InvList {
    pub field: String,
    /// Collection term frequency, the sum of all posting term frequencies
    pub ctf: u64,
    pub postings: Vec<Posting>,
}

impl InvList {
    pub fn empty(field: &str) -> Self {
        InvList { field: field.to_owned(), ctf: 0, postings: Vec::new() }
    }

    #[inline(always)]
    pub fn df(&self) -> usize {
        self.postings.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    pub fn get_doc_id(&self, idx: usize) -> u32 {
        self.postings[idx].doc_id
    }

    pub fn get_tf(&self, idx: usize) -> u32 {
        self.postings[idx].tf()
    }

    /// Appends a posting. Doc ids must arrive in ascending order, and empty
    /// position lists are ignored.
    pub fn append_posting(&mut self, doc_id: u32, positions: Vec<u32>) {
        debug_assert!(self.postings.last().map_or(true, |last| last.doc_id < doc_id));

        if positions.is_empty() {
            return;
        }

        self.ctf += positions.len() as u64;
        self.postings.push(Posting { doc_id, positions });
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{InvList, Posting};

    #[test]
    fn test_posting_merge() {
        assert_eq!(
            Posting::merge(&Posting::new(0, vec![1, 2]), &Posting::new(0, vec![120])),
            Posting::new(0, vec![1, 2, 120]),
        );

        assert_eq!(
            Posting::merge(&Posting::new(3, vec![5, 9]), &Posting::new(3, vec![1, 5, 7, 12])),
            Posting::new(3, vec![1, 5, 7, 9, 12]),
        );

        assert_eq!(
            Posting::merge(&Posting::new(3, vec![]), &Posting::new(3, vec![4])),
            Posting::new(3, vec![4]),
        );
    }

    #[test]
    fn test_append_posting_tracks_ctf() {
        let mut list = InvList::empty("body");
        list.append_posting(1, vec![0, 4]);
        list.append_posting(2, vec![]);
        list.append_posting(5, vec![3]);

        assert_eq!(list.ctf, 3);
        assert_eq!(list.df(), 2);
        assert_eq!(list.get_doc_id(1), 5);
        assert_eq!(list.get_tf(0), 2);
    }
}
