use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Forecast already carries id {0} and cannot be saved again")]
    DuplicateIdentifier(u64),

    #[error("No forecast stored with id {0}")]
    NotFound(u64),

    #[error("Failed to determine the platform data directory")]
    StorageDirResolution,

    #[error("Failed to create storage directory '{0}'")]
    StorageDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to list storage directory '{0}'")]
    ListDir(PathBuf, #[source] std::io::Error),

    #[error("Failed to read forecast file '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to write forecast file '{0}'")]
    Write(PathBuf, #[source] std::io::Error),

    #[error("Failed to encode forecast record")]
    Encode(#[source] Box<bincode::error::EncodeError>),

    #[error("Failed to decode forecast record from '{0}'")]
    Decode(PathBuf, #[source] Box<bincode::error::DecodeError>),

    #[error("Failed to convert forecast table to or from Parquet")]
    Parquet(#[source] PolarsError),
}
