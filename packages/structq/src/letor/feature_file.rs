use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use super::features::FeatureVector;
use crate::{Error, Result};

/// One line of a ranker feature file, `label qid:Q 1:v 2:v ... # external_id`
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureLine {
    pub label: i32,
    pub qid: u32,
    pub features: FeatureVector,
    pub external_id: String,
}

impl fmt::Display for FeatureLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} qid:{}", self.label, self.qid)?;
        for (feature, value) in self.features.iter() {
            write!(f, " {}:{:.14}", feature, value)?;
        }
        write!(f, " # {}", self.external_id)
    }
}

pub fn write_feature_file(path: &Path, lines: &[FeatureLine]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for line in lines {
        writeln!(writer, "{}", line)?;
    }
    writer.flush()?;

    Ok(())
}

/// Query id and external id of a feature file line
fn parse_line_keys(line: &str) -> Option<(u32, String)> {
    let (features, external_id) = line.split_once('#')?;
    let qid = features.split_whitespace().nth(1)?.strip_prefix("qid:")?.parse().ok()?;

    Some((qid, external_id.trim().to_owned()))
}

/// Pairs every feature file line with the ranker score on the same line of the
/// score file, grouped by query id.
pub fn read_scored_lines(feature_path: &Path, scores_path: &Path) -> Result<BTreeMap<u32, Vec<(String, f64)>>> {
    let feature_file = feature_path.display().to_string();
    let scores_file = scores_path.display().to_string();

    let features = fs::read_to_string(feature_path)?;
    let scores = fs::read_to_string(scores_path)?;

    let feature_lines: Vec<&str> = features.lines().filter(|l| !l.trim().is_empty()).collect();
    let score_lines: Vec<&str> = scores.lines().filter(|l| !l.trim().is_empty()).collect();
    if feature_lines.len() != score_lines.len() {
        return Err(Error::Parse {
            file: scores_file,
            line: score_lines.len(),
            reason: format!("{} scores for {} feature lines", score_lines.len(), feature_lines.len()),
        });
    }

    let mut scored: BTreeMap<u32, Vec<(String, f64)>> = BTreeMap::new();
    for (idx, (feature_line, score_line)) in feature_lines.iter().zip(score_lines.iter()).enumerate() {
        let (qid, external_id) = parse_line_keys(feature_line).ok_or_else(|| Error::Parse {
            file: feature_file.clone(),
            line: idx + 1,
            reason: "expected `label qid:Q ... # external_id`".to_owned(),
        })?;
        let score: f64 = score_line.trim().parse().map_err(|_| Error::Parse {
            file: scores_file.clone(),
            line: idx + 1,
            reason: format!("`{}` is not a score", score_line.trim()),
        })?;

        scored.entry(qid).or_insert_with(Vec::new).push((external_id, score));
    }

    Ok(scored)
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{read_scored_lines, write_feature_file, FeatureLine};
    use crate::letor::FeatureVector;
    use crate::Error;

    fn line(label: i32, qid: u32, values: &[(usize, f64)], external_id: &str) -> FeatureLine {
        let mut features = FeatureVector::default();
        for &(feature, value) in values {
            features.set(feature, value);
        }
        FeatureLine { label, qid, features, external_id: external_id.to_owned() }
    }

    #[test]
    fn test_display() {
        assert_eq!(
            line(2, 15, &[(1, 0.5), (18, 1.0)], "clueweb09-en0000-00-00000").to_string(),
            "2 qid:15 1:0.50000000000000 18:1.00000000000000 # clueweb09-en0000-00-00000",
        );
        assert_eq!(line(0, 3, &[], "d").to_string(), "0 qid:3 # d");
    }

    #[test]
    fn test_read_scored_lines() {
        let dir = tempfile::tempdir().unwrap();
        let features_path = dir.path().join("features.txt");
        let scores_path = dir.path().join("scores.txt");

        write_feature_file(
            &features_path,
            &[line(0, 1, &[(1, 0.0)], "a"), line(0, 1, &[(1, 1.0)], "b"), line(0, 2, &[(1, 1.0)], "c")],
        )
        .unwrap();
        std::fs::write(&scores_path, "0.25\n-1.5\n3\n").unwrap();

        let scored = read_scored_lines(&features_path, &scores_path).unwrap();
        assert_eq!(scored[&1], vec![("a".to_owned(), 0.25), ("b".to_owned(), -1.5)]);
        assert_eq!(scored[&2], vec![("c".to_owned(), 3.0)]);

        std::fs::write(&scores_path, "0.25\n").unwrap();
        assert!(matches!(read_scored_lines(&features_path, &scores_path), Err(Error::Parse { .. })));
    }
}
