pub mod cursor;
pub mod error;
pub mod expansion;
pub mod query_tree;
pub mod score_list;
pub mod searcher;

pub use error::QueryError;
pub use query_tree::{QueryNode, WeightKind};
pub use searcher::{QueryResult, Searcher};
