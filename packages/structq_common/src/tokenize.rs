use rust_stemmers::{Algorithm, Stemmer};
use rustc_hash::FxHashSet;

/// Turns raw query text into index terms.
///
/// Stemming, if any, is the implementor's business; the engine only ever sees
/// the returned terms.
pub trait QueryTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String>;

    fn is_stop_word(&self, term: &str) -> bool;
}

fn get_default_stop_words() -> Vec<String> {
    vec![
        "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is", "it", "no",
        "not", "of", "on", "or", "such", "that", "the", "their", "then", "there", "these", "they", "this",
        "to", "was", "will", "with",
    ]
    .into_iter()
    .map(|s| s.to_owned())
    .collect()
}

fn get_default_max_term_len() -> usize {
    80
}

fn get_stemmer(language: &str) -> Stemmer {
    match language.to_lowercase().as_str() {
        "arabic" => Stemmer::create(Algorithm::Arabic),
        "danish" => Stemmer::create(Algorithm::Danish),
        "dutch" => Stemmer::create(Algorithm::Dutch),
        "finnish" => Stemmer::create(Algorithm::Finnish),
        "french" => Stemmer::create(Algorithm::French),
        "german" => Stemmer::create(Algorithm::German),
        "hungarian" => Stemmer::create(Algorithm::Hungarian),
        "italian" => Stemmer::create(Algorithm::Italian),
        "norwegian" => Stemmer::create(Algorithm::Norwegian),
        "portuguese" => Stemmer::create(Algorithm::Portuguese),
        "romanian" => Stemmer::create(Algorithm::Romanian),
        "spanish" => Stemmer::create(Algorithm::Spanish),
        "swedish" => Stemmer::create(Algorithm::Swedish),
        "turkish" => Stemmer::create(Algorithm::Turkish),
        _ => Stemmer::create(Algorithm::English),
    }
}

/// Lowercasing tokenizer splitting on anything that is not ascii alphanumeric,
/// optionally stemming what survives the stop word filter.
pub struct AsciiTokenizer {
    stop_words: FxHashSet<String>,
    max_term_len: usize,
    stemmer: Option<Stemmer>,
}

impl Default for AsciiTokenizer {
    fn default() -> Self {
        AsciiTokenizer::new(get_default_stop_words())
    }
}

impl AsciiTokenizer {
    pub fn new(stop_words: Vec<String>) -> Self {
        AsciiTokenizer {
            stop_words: stop_words.into_iter().map(|w| w.to_lowercase()).collect(),
            max_term_len: get_default_max_term_len(),
            stemmer: None,
        }
    }

    /// Stems terms with the snowball stemmer of `language`, english if unknown.
    pub fn with_stemmer(mut self, language: &str) -> Self {
        self.stemmer = Some(get_stemmer(language));
        self
    }
}

impl QueryTokenizer for AsciiTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        text.split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|slice| !slice.is_empty() && slice.len() <= self.max_term_len)
            .map(|slice| slice.to_ascii_lowercase())
            .filter(|term| !self.is_stop_word(term))
            .map(|term| match &self.stemmer {
                Some(stemmer) => stemmer.stem(&term).into_owned(),
                None => term,
            })
            .collect()
    }

    fn is_stop_word(&self, term: &str) -> bool {
        self.stop_words.contains(term)
    }
}
