use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::info;
use structq_common::q_debug;

use crate::config::LetorConfig;
use crate::{Error, Result};

/// Drives the external SVM-rank style training and classification programs.
pub struct SvmRanker {
    learn_path: PathBuf,
    classify_path: PathBuf,
    c: f64,
}

impl SvmRanker {
    pub fn new(learn_path: PathBuf, classify_path: PathBuf, c: f64) -> Self {
        SvmRanker { learn_path, classify_path, c }
    }

    pub fn from_config(config: &LetorConfig) -> Self {
        SvmRanker::new(config.svm_rank_learn_path.clone(), config.svm_rank_classify_path.clone(), config.svm_c)
    }

    /// `learn -c C features model`
    pub fn train(&self, features: &Path, model: &Path) -> Result<()> {
        let c = self.c.to_string();
        run(&self.learn_path, &[OsStr::new("-c"), OsStr::new(&c), features.as_os_str(), model.as_os_str()])?;
        info!("Trained ranker model {}", model.display());
        Ok(())
    }

    /// `classify features model scores`, writing one score per feature line
    pub fn classify(&self, features: &Path, model: &Path, scores: &Path) -> Result<()> {
        run(&self.classify_path, &[features.as_os_str(), model.as_os_str(), scores.as_os_str()])?;
        info!("Wrote ranker scores to {}", scores.display());
        Ok(())
    }
}

fn run(program: &Path, args: &[&OsStr]) -> Result<()> {
    let output = Command::new(program).args(args).stdin(Stdio::null()).output()?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    for line in stdout.lines().chain(stderr.lines()) {
        q_debug!("{}: {}", program.display(), line);
    }

    if output.status.success() {
        Ok(())
    } else {
        Err(Error::Ranker {
            program: program.display().to_string(),
            status: output.status.code(),
            output: format!("{}{}", stdout, stderr).trim().to_owned(),
        })
    }
}

#[cfg(all(test, unix))]
mod test {
    use std::path::{Path, PathBuf};

    use pretty_assertions::assert_eq;

    use super::SvmRanker;
    use crate::Error;

    fn ranker(program: &str) -> SvmRanker {
        SvmRanker::new(PathBuf::from(program), PathBuf::from(program), 0.001)
    }

    #[test]
    fn test_successful_runs() {
        let ranker = ranker("true");
        assert!(ranker.train(Path::new("features"), Path::new("model")).is_ok());
        assert!(ranker.classify(Path::new("features"), Path::new("model"), Path::new("scores")).is_ok());
    }

    #[test]
    fn test_failed_run() {
        match ranker("false").train(Path::new("features"), Path::new("model")) {
            Err(Error::Ranker { program, status, .. }) => {
                assert_eq!(program, "false");
                assert_eq!(status, Some(1));
            }
            other => panic!("expected a ranker error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_program() {
        let result = ranker("/nonexistent/svm_rank_learn").train(Path::new("features"), Path::new("model"));
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
