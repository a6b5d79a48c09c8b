use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Cannot combine weather data of different locations: '{left}' and '{right}'")]
    LocationMismatch { left: String, right: String },

    #[error("Invalid coordinate '{0}'")]
    InvalidCoordinate(String),

    #[error("Failed processing weather table: {0}")]
    Frame(#[from] PolarsError),
}
