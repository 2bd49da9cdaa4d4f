use thiserror::Error;

use crate::{config::LoadError, domain::error::ValidationErrors, infra::error::InfraError};

/// Failures surfaced by catalog operations.
///
/// `Clone` so every waiter attached to a coalesced fetch receives the same error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("product `{id}` not found")]
    NotFound { id: String },
    #[error("an active session is required")]
    Unauthorized,
    #[error("transient failure: {0}")]
    Transient(String),
}

impl CatalogError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient(message.into())
    }

    /// Whether an explicit retry could succeed without the caller changing input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CatalogError::Transient(_))
    }
}

impl From<ValidationErrors> for CatalogError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Config(#[from] LoadError),
}

impl AppError {
    /// Process exit code used by the binary.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Catalog(CatalogError::NotFound { .. }) => 3,
            AppError::Catalog(CatalogError::Validation(_)) | AppError::Config(_) => 2,
            AppError::Catalog(_) | AppError::Infra(_) => 1,
        }
    }
}
