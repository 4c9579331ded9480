use std::io;

use structq_search::QueryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("{file}, line {line}: {reason}")]
    Parse { file: String, line: usize, reason: String },

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("`{program}` failed with exit status {status:?}: {output}")]
    Ranker { program: String, status: Option<i32>, output: String },
}

pub type Result<T> = std::result::Result<T, Error>;
