use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("storage error: {0}")]
    Persistence(String),
}

impl ServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "validation",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Persistence(_) => "persistence",
        }
    }
}

/// Logs a storage failure with the operation that hit it and wraps it for the caller.
pub(crate) fn persistence(operation: &'static str, err: anyhow::Error) -> ServiceError {
    log::error!("{} failed: {:#}", operation, err);
    ServiceError::Persistence(format!("{operation} failed: {err}"))
}
