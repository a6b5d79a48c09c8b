use polars::error::PolarsError;
use thiserror::Error;

/// A call to a third-party weather provider failed.
#[derive(Debug, Error)]
pub enum ExternalCallError {
    #[error("[{provider}] failed to build the HTTP client")]
    Client {
        provider: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("[{provider}] network request failed for {url}")]
    NetworkRequest {
        provider: String,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("[{provider}] request to {url} failed with status {status}: {message}")]
    HttpStatus {
        provider: String,
        url: String,
        status: u16,
        message: String,
    },

    #[error("[{provider}] unexpected response: {message}")]
    InvalidResponse { provider: String, message: String },

    #[error("[{provider}] failed building the response table")]
    Frame {
        provider: String,
        #[source]
        source: PolarsError,
    },

    // Covers stream errors while downloading and decompressing
    #[error("[{provider}] data download or decompression failed")]
    Download {
        provider: String,
        #[source]
        source: std::io::Error,
    },

    #[error("[{provider}] does not support {capability}")]
    Unsupported {
        provider: String,
        capability: &'static str,
    },

    #[error("No weather station within {max_distance_km} km of ({lat}, {lon})")]
    NoStationNearby {
        lat: f64,
        lon: f64,
        max_distance_km: f64,
    },

    #[error("Invalid coordinate '{0}'")]
    InvalidCoordinate(String),

    #[error("Failed to start the download runtime")]
    Runtime(#[source] std::io::Error),
}

impl ExternalCallError {
    pub(crate) fn frame(provider: &str) -> impl FnOnce(PolarsError) -> Self + '_ {
        move |source| ExternalCallError::Frame {
            provider: provider.to_string(),
            source,
        }
    }

    pub(crate) fn invalid(provider: &str, message: impl Into<String>) -> Self {
        ExternalCallError::InvalidResponse {
            provider: provider.to_string(),
            message: message.into(),
        }
    }
}
