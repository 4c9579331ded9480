use thiserror::Error;

/// Fatal errors of a query evaluation. Any of these aborts the whole query.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum QueryError {
    #[error("arguments of {operator} must be in the same field, expected `{expected}` but found `{found}`")]
    FieldMismatch { operator: String, expected: String, found: String },

    #[error("{operator} only accepts arguments that produce inverted lists")]
    InvalidArgument { operator: String },

    #[error("{operator} is not supported by the {model} retrieval model")]
    UnsupportedOperator { operator: String, model: &'static str },

    #[error("malformed query: {0}")]
    MalformedQuery(String),

    #[error("read past the end of an exhausted cursor")]
    Exhausted,
}
