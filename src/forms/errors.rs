//! # Engine Errors
//!
//! Boundary failures of engine operations. Rejected submissions are not
//! errors; they come back as a `ValidationResult`.

use thiserror::Error;

use crate::config::ConfigError;
use crate::schema::SchemaViolation;
use crate::store::StoreError;

pub type FormsResult<T> = Result<T, FormsError>;

#[derive(Debug, Clone, Error)]
pub enum FormsError {
    /// Schema text is not JSON data
    #[error("Invalid schema payload. Expected JSON data.")]
    InvalidPayload,

    /// Schema decoded but broke an authoring rule
    #[error("{0}")]
    Schema(#[from] SchemaViolation),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Request could not be decoded
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl FormsError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            FormsError::InvalidPayload => "invalid_payload",
            FormsError::Schema(_) => "invalid_schema",
            FormsError::Store(e) => e.code(),
            FormsError::Config(_) => "config",
            FormsError::InvalidRequest(_) => "invalid_request",
        }
    }
}
