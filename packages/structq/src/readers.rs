use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::warn;
use rustc_hash::FxHashMap;

use crate::{Error, Result};

#[derive(Clone, Debug, PartialEq)]
pub struct QueryLine {
    pub qid: u32,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Judgment {
    pub external_id: String,
    pub relevance: i32,
}

/// Relevance judgments per query id, in file order
pub type Judgments = BTreeMap<u32, Vec<Judgment>>;

/// `(external id, score)` per query id, in file order
pub type InitialRankings = BTreeMap<u32, Vec<(String, f64)>>;

fn parse_error(file: &str, line: usize, reason: String) -> Error {
    Error::Parse { file: file.to_owned(), line, reason }
}

fn parse_qid(file: &str, line_no: usize, raw: &str) -> Result<u32> {
    raw.trim()
        .parse()
        .map_err(|_| parse_error(file, line_no, format!("`{}` is not a query id", raw)))
}

/// Reads `qid:query text` lines, skipping blank ones.
pub fn parse_queries(content: &str, file: &str) -> Result<Vec<QueryLine>> {
    let mut queries = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (qid, text) = match line.split_once(':') {
            Some(split) => split,
            None => return Err(parse_error(file, idx + 1, "expected `qid:query`".to_owned())),
        };

        queries.push(QueryLine { qid: parse_qid(file, idx + 1, qid)?, text: text.trim().to_owned() });
    }

    Ok(queries)
}

pub fn read_queries(path: &Path) -> Result<Vec<QueryLine>> {
    parse_queries(&fs::read_to_string(path)?, &path.display().to_string())
}

/// Reads `qid <ignored> external_id relevance` lines.
/// A repeated judgment of the same document replaces the earlier one.
pub fn parse_judgments(content: &str, file: &str) -> Result<Judgments> {
    let mut judgments = Judgments::new();

    for (idx, line) in content.lines().enumerate() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() != 4 {
            return Err(parse_error(file, idx + 1, format!("expected 4 fields, found {}", fields.len())));
        }

        let qid = parse_qid(file, idx + 1, fields[0])?;
        let relevance: i32 = fields[3]
            .parse()
            .map_err(|_| parse_error(file, idx + 1, format!("`{}` is not a relevance value", fields[3])))?;

        let query_judgments = judgments.entry(qid).or_insert_with(Vec::new);
        match query_judgments.iter_mut().find(|j| j.external_id == fields[2]) {
            Some(existing) => existing.relevance = relevance,
            None => query_judgments.push(Judgment { external_id: fields[2].to_owned(), relevance }),
        }
    }

    Ok(judgments)
}

pub fn read_judgments(path: &Path) -> Result<Judgments> {
    parse_judgments(&fs::read_to_string(path)?, &path.display().to_string())
}

/// Reads a TREC run, `qid Q0 external_id rank score run_id`.
pub fn parse_initial_rankings(content: &str, file: &str) -> Result<InitialRankings> {
    let mut rankings = InitialRankings::new();

    for (idx, line) in content.lines().enumerate() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() != 6 {
            return Err(parse_error(file, idx + 1, format!("expected 6 fields, found {}", fields.len())));
        }

        let qid = parse_qid(file, idx + 1, fields[0])?;
        let score: f64 = fields[4]
            .parse()
            .map_err(|_| parse_error(file, idx + 1, format!("`{}` is not a score", fields[4])))?;

        rankings.entry(qid).or_insert_with(Vec::new).push((fields[2].to_owned(), score));
    }

    Ok(rankings)
}

pub fn read_initial_rankings(path: &Path) -> Result<InitialRankings> {
    parse_initial_rankings(&fs::read_to_string(path)?, &path.display().to_string())
}

/// Reads `external_id<TAB>score` lines. Malformed lines are skipped,
/// and the first score of a document wins.
pub fn parse_pagerank(content: &str) -> FxHashMap<String, f64> {
    let mut pagerank = FxHashMap::default();

    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let parsed = line
            .split_once('\t')
            .and_then(|(external_id, score)| Some((external_id.trim(), score.trim().parse::<f64>().ok()?)));

        match parsed {
            Some((external_id, score)) => {
                pagerank.entry(external_id.to_owned()).or_insert(score);
            }
            None => warn!("Skipping malformed pagerank line {}: {}", idx + 1, line),
        }
    }

    pagerank
}

pub fn read_pagerank(path: &Path) -> Result<FxHashMap<String, f64>> {
    Ok(parse_pagerank(&fs::read_to_string(path)?))
}
