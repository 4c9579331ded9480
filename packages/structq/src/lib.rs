pub mod config;
pub mod error;
pub mod letor;
pub mod ranker;
pub mod readers;
pub mod runner;

pub use config::StructqConfig;
pub use error::{Error, Result};
