pub mod debug;
pub mod idf;
