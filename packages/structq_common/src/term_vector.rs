use rustc_hash::FxHashMap;

/// Collection statistics of one stem in a document's term vector
#[derive(Clone, Debug, PartialEq)]
pub struct TermStats {
    pub term: String,
    /// Frequency of the stem in this document's field
    pub freq: u32,
    pub df: u32,
    pub ctf: u64,
}

/// Per-document, per-field stem statistics.
#[derive(Clone, Debug, Default)]
pub struct TermVector {
    stems: Vec<TermStats>,
    lookup: FxHashMap<String, usize>,
}

impl TermVector {
    pub fn new(stems: Vec<TermStats>) -> Self {
        let lookup = stems
            .iter()
            .enumerate()
            .map(|(idx, stats)| (stats.term.clone(), idx))
            .collect();

        TermVector { stems, lookup }
    }

    pub fn get_index(&self, term: &str) -> Option<usize> {
        self.lookup.get(term).copied()
    }

    pub fn get(&self, term: &str) -> Option<&TermStats> {
        self.get_index(term).map(|idx| &self.stems[idx])
    }

    pub fn stems(&self) -> &[TermStats] {
        &self.stems
    }

    pub fn len(&self) -> usize {
        self.stems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stems.is_empty()
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{TermStats, TermVector};

    #[test]
    fn test_lookup() {
        let tv = TermVector::new(vec![
            TermStats { term: "apple".to_owned(), freq: 2, df: 3, ctf: 7 },
            TermStats { term: "pie".to_owned(), freq: 1, df: 1, ctf: 1 },
        ]);

        assert_eq!(tv.get_index("pie"), Some(1));
        assert_eq!(tv.get("apple").map(|s| s.freq), Some(2));
        assert_eq!(tv.get("banana"), None);
        assert_eq!(tv.len(), 2);
    }
}
