use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

use crate::index::IndexReader;
use crate::postings_list::{InvList, Posting};
use crate::term_vector::{TermStats, TermVector};

#[derive(Default)]
struct FieldIndex {
    postings: FxHashMap<String, Vec<Posting>>,
    doc_lengths: FxHashMap<u32, u64>,
    total_terms: u64,
}

impl FieldIndex {
    fn ctf(&self, term: &str) -> u64 {
        self.postings
            .get(term)
            .map_or(0, |postings| postings.iter().map(|p| p.tf() as u64).sum())
    }
}

struct DocInfo {
    external_id: String,
    attributes: FxHashMap<String, String>,
    fields: FxHashMap<String, Vec<String>>,
}

/// An inverted index held entirely in memory.
///
/// Field text is expected to be analyzed already: terms are separated by whitespace,
/// and a term's position is its token offset within the field.
#[derive(Default)]
pub struct MemoryIndex {
    fields: FxHashMap<String, FieldIndex>,
    docs: Vec<DocInfo>,
    internal_ids: FxHashMap<String, u32>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        MemoryIndex::default()
    }

    /// Adds a document and returns its internal doc id.
    pub fn add_document(&mut self, external_id: &str, fields: &[(&str, &str)]) -> u32 {
        let doc_id = self.docs.len() as u32;

        let mut doc_fields = FxHashMap::default();
        for &(field_name, text) in fields {
            let terms: Vec<String> = text.split_whitespace().map(|t| t.to_owned()).collect();
            if terms.is_empty() {
                continue;
            }

            let mut positions: BTreeMap<&str, Vec<u32>> = BTreeMap::new();
            for (pos, term) in terms.iter().enumerate() {
                positions.entry(term.as_str()).or_insert_with(Vec::new).push(pos as u32);
            }

            let field_index = self.fields.entry(field_name.to_owned()).or_insert_with(FieldIndex::default);
            for (term, term_positions) in positions {
                field_index
                    .postings
                    .entry(term.to_owned())
                    .or_insert_with(Vec::new)
                    .push(Posting::new(doc_id, term_positions));
            }
            field_index.doc_lengths.insert(doc_id, terms.len() as u64);
            field_index.total_terms += terms.len() as u64;

            doc_fields.insert(field_name.to_owned(), terms);
        }

        self.internal_ids.insert(external_id.to_owned(), doc_id);
        self.docs.push(DocInfo {
            external_id: external_id.to_owned(),
            attributes: FxHashMap::default(),
            fields: doc_fields,
        });

        doc_id
    }

    pub fn set_attribute(&mut self, doc_id: u32, name: &str, value: &str) {
        if let Some(doc) = self.docs.get_mut(doc_id as usize) {
            doc.attributes.insert(name.to_owned(), value.to_owned());
        }
    }
}

impl IndexReader for MemoryIndex {
    fn inverted_list(&self, term: &str, field: &str) -> InvList {
        let mut list = InvList::empty(field);

        if let Some(postings) = self.fields.get(field).and_then(|f| f.postings.get(term)) {
            for posting in postings {
                list.append_posting(posting.doc_id, posting.positions.clone());
            }
        }

        list
    }

    fn term_vector(&self, doc_id: u32, field: &str) -> Option<TermVector> {
        let terms = self.docs.get(doc_id as usize)?.fields.get(field)?;
        let field_index = self.fields.get(field)?;

        let mut freqs: BTreeMap<&str, u32> = BTreeMap::new();
        for term in terms {
            *freqs.entry(term.as_str()).or_insert(0) += 1;
        }

        let stems = freqs
            .into_iter()
            .map(|(term, freq)| TermStats {
                term: term.to_owned(),
                freq,
                df: field_index.postings.get(term).map_or(0, |p| p.len() as u32),
                ctf: field_index.ctf(term),
            })
            .collect();

        Some(TermVector::new(stems))
    }

    fn doc_length(&self, field: &str, doc_id: u32) -> u64 {
        self.fields
            .get(field)
            .and_then(|f| f.doc_lengths.get(&doc_id))
            .copied()
            .unwrap_or(0)
    }

    fn sum_total_term_freq(&self, field: &str) -> u64 {
        self.fields.get(field).map_or(0, |f| f.total_terms)
    }

    fn doc_count(&self, field: &str) -> u32 {
        self.fields.get(field).map_or(0, |f| f.doc_lengths.len() as u32)
    }

    fn num_docs(&self) -> u32 {
        self.docs.len() as u32
    }

    fn total_term_freq(&self, term: &str, field: &str) -> u64 {
        self.fields.get(field).map_or(0, |f| f.ctf(term))
    }

    fn external_id(&self, doc_id: u32) -> Option<String> {
        self.docs.get(doc_id as usize).map(|d| d.external_id.clone())
    }

    fn internal_id(&self, external_id: &str) -> Option<u32> {
        self.internal_ids.get(external_id).copied()
    }

    fn doc_attribute(&self, doc_id: u32, name: &str) -> Option<String> {
        self.docs.get(doc_id as usize)?.attributes.get(name).cloned()
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::MemoryIndex;
    use crate::index::IndexReader;
    use crate::postings_list::Posting;

    fn sample_index() -> MemoryIndex {
        let mut index = MemoryIndex::new();
        index.add_document("d0", &[("body", "apple pie apple"), ("title", "apple")]);
        index.add_document("d1", &[("body", "banana pie")]);
        index.add_document("d2", &[("body", ""), ("title", "banana")]);
        index
    }

    #[test]
    fn test_inverted_list() {
        let index = sample_index();

        let apple = index.inverted_list("apple", "body");
        assert_eq!(apple.postings, vec![Posting::new(0, vec![0, 2])]);
        assert_eq!(apple.ctf, 2);

        let pie = index.inverted_list("pie", "body");
        assert_eq!(pie.postings.iter().map(|p| p.doc_id).collect::<Vec<_>>(), vec![0, 1]);

        assert!(index.inverted_list("cherry", "body").is_empty());
        assert!(index.inverted_list("apple", "url").is_empty());
    }

    #[test]
    fn test_field_statistics() {
        let index = sample_index();

        assert_eq!(index.num_docs(), 3);
        assert_eq!(index.doc_count("body"), 2);
        assert_eq!(index.doc_count("title"), 2);
        assert_eq!(index.sum_total_term_freq("body"), 5);
        assert_eq!(index.doc_length("body", 0), 3);
        assert_eq!(index.doc_length("body", 2), 0);
        assert!((index.avg_doc_length("body") - 2.5).abs() < 1e-12);
        assert_eq!(index.total_term_freq("pie", "body"), 2);
    }

    #[test]
    fn test_term_vector() {
        let index = sample_index();

        let tv = index.term_vector(0, "body").unwrap();
        assert_eq!(tv.len(), 2);
        let apple = tv.get("apple").unwrap();
        assert_eq!((apple.freq, apple.df, apple.ctf), (2, 1, 2));
        let pie = tv.get("pie").unwrap();
        assert_eq!((pie.freq, pie.df, pie.ctf), (1, 2, 2));

        assert!(index.term_vector(2, "body").is_none());
        assert!(index.term_vector(9, "body").is_none());
    }

    #[test]
    fn test_ids_and_attributes() {
        let mut index = sample_index();
        index.set_attribute(1, "rawUrl", "http://a.org/x/y");

        assert_eq!(index.internal_id("d1"), Some(1));
        assert_eq!(index.internal_id("missing"), None);
        assert_eq!(index.external_id(2).as_deref(), Some("d2"));
        assert_eq!(index.doc_attribute(1, "rawUrl").as_deref(), Some("http://a.org/x/y"));
        assert_eq!(index.doc_attribute(0, "rawUrl"), None);
    }
}
