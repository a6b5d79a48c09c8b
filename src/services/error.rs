use crate::mapping::error::MappingNotFoundError;
use crate::providers::error::ExternalCallError;
use polars::error::PolarsError;
use thiserror::Error;

/// A value could not be translated between the domain and a provider's vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[{provider}] cannot translate '{value}'")]
pub struct TranslationError {
    pub provider: String,
    pub value: String,
    #[source]
    pub source: MappingNotFoundError,
}

/// No external service is registered under the requested name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Provider '{name}' not found, registered providers: [{}]", .registered.join(", "))]
pub struct ProviderNotFoundError {
    pub name: String,
    pub registered: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Translation(#[from] TranslationError),

    #[error(transparent)]
    External(#[from] ExternalCallError),

    #[error(transparent)]
    ProviderNotFound(#[from] ProviderNotFoundError),

    #[error("[{provider}] no weather parameters requested")]
    NoParameters { provider: String },

    #[error("[{provider}] response has no timestamp column")]
    MissingTimestamp { provider: String },

    #[error("Failed processing forecast table: {0}")]
    Frame(#[from] PolarsError),
}
