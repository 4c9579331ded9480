#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DocScore {
    pub doc_id: u32,
    pub score: f64,
}

/// Document scores, strictly ascending by doc id.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScoreList {
    pub scores: Vec<DocScore>,
}

impl ScoreList {
    pub fn new() -> Self {
        ScoreList::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        ScoreList { scores: Vec::with_capacity(capacity) }
    }

    pub fn add(&mut self, doc_id: u32, score: f64) {
        debug_assert!(self.scores.last().map_or(true, |last| last.doc_id < doc_id));
        self.scores.push(DocScore { doc_id, score });
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn get_doc_id(&self, idx: usize) -> u32 {
        self.scores[idx].doc_id
    }

    pub fn get_score(&self, idx: usize) -> f64 {
        self.scores[idx].score
    }

    pub fn score_of(&self, doc_id: u32) -> Option<f64> {
        self.scores
            .binary_search_by_key(&doc_id, |entry| entry.doc_id)
            .ok()
            .map(|idx| self.scores[idx].score)
    }
}
