use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Forecast for '{forecast}' cannot be compared with weather log for '{log}'")]
    LocationMismatch { forecast: String, log: String },

    #[error("No forecast values could be compared with observations yet")]
    NothingAnalyzed,

    #[error("Failed aligning forecast and observations: {0}")]
    Frame(#[from] PolarsError),
}
