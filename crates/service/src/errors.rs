use models::errors::ModelError;
use thiserror::Error;

use crate::storage::StoreError;

/// Errors surfaced by the expense and user stores.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Neveljavni podatki: {0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    /// A backend failure, prefixed with the operation that hit it.
    #[error("{context}: {source}")]
    Storage {
        context: &'static str,
        #[source]
        source: StoreError,
    },
    #[error("Napaka pri zgoščevanju gesla: {0}")]
    Hash(String),
}

impl ServiceError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            ServiceError::Validation(_) => 1001,
            ServiceError::Conflict(_) => 1002,
            ServiceError::NotFound(_) => 1003,
            ServiceError::Hash(_) => 1101,
            ServiceError::Storage { .. } => 1200,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::NotFound(_))
    }
}

/// Wrap a store failure with an operation context. Rejected queries are the
/// caller's fault and come back as `Validation`.
pub fn storage(context: &'static str) -> impl FnOnce(StoreError) -> ServiceError {
    move |source| match source {
        StoreError::InvalidQuery(msg) => ServiceError::Validation(msg),
        source => ServiceError::Storage { context, source },
    }
}

impl From<ModelError> for ServiceError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Validation(msg) => ServiceError::Validation(msg),
            ModelError::Db(msg) => ServiceError::Storage { context: "Napaka v bazi", source: StoreError::Backend(msg) },
        }
    }
}
