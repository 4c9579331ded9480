pub mod index;
pub mod memory_index;
pub mod postings_list;
pub mod retrieval_model;
pub mod term_vector;
pub mod tokenize;
pub mod utils;

#[doc(hidden)]
pub use log;

/// Field searched when a query term does not name one
pub static DEFAULT_FIELD: &str = "body";
