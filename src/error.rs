use crate::analysis::error::AnalysisError;
use crate::mapping::error::MappingNotFoundError;
use crate::providers::error::ExternalCallError;
use crate::repository::error::RepositoryError;
use crate::services::error::{ProviderNotFoundError, ServiceError, TranslationError};
use crate::types::error::DomainError;
use thiserror::Error;

/// Any error this crate can produce.
#[derive(Debug, Error)]
pub enum ArbiterError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    External(#[from] ExternalCallError),

    #[error(transparent)]
    Translation(#[from] TranslationError),

    #[error(transparent)]
    ProviderNotFound(#[from] ProviderNotFoundError),

    #[error(transparent)]
    Mapping(#[from] MappingNotFoundError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
