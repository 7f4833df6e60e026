//! # Store Errors

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence failures
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Form not found: {0}")]
    FormNotFound(u64),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Corrupt record in {location}: {reason}")]
    Corrupt { location: String, reason: String },

    #[error("Store lock poisoned")]
    LockPoisoned,
}

impl StoreError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::FormNotFound(_) => "form_not_found",
            StoreError::Io(_) => "store_io",
            StoreError::Corrupt { .. } => "store_corrupt",
            StoreError::LockPoisoned => "store_lock",
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(StoreError::FormNotFound(3).code(), "form_not_found");
        assert_eq!(StoreError::LockPoisoned.code(), "store_lock");
        assert_eq!(StoreError::FormNotFound(3).to_string(), "Form not found: 3");
    }
}
