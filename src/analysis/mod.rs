pub mod analyzer;
pub mod error;
pub mod sources;
