//! Storage backend errors.
//!
//! These never cross the public cart API: the persistent store adapter logs
//! and absorbs them. They exist so backends can say what went wrong.

use thiserror::Error;

/// Failure reported by a [`KeyValueStorage`](crate::storage::KeyValueStorage) backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The write would exceed the backend's size limit.
    #[error("storage quota of {limit} bytes exceeded")]
    QuotaExceeded { limit: usize },

    /// Storage is disabled or inaccessible (private browsing, blocked origin).
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Filesystem operation failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::QuotaExceeded { limit: 5 };
        assert_eq!(err.to_string(), "storage quota of 5 bytes exceeded");

        let err = StorageError::Unavailable("private mode".to_string());
        assert_eq!(err.to_string(), "storage unavailable: private mode");
    }
}
