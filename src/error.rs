//! Error types for store operations.

use std::time::Duration;
use thiserror::Error;

/// Errors returned by [`KvStore`](crate::store::KvStore) operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No live entry exists for the requested key
    #[error("key not found")]
    NotFound,

    /// The actor worker has stopped and can no longer serve requests
    #[error("store is closed")]
    Closed,

    /// The actor worker did not reply within the configured timeout
    #[error("timed out after {0:?} waiting for reply")]
    Timeout(Duration),
}

impl StoreError {
    /// Whether this error only reports a missing key
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound)
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(StoreError::NotFound.to_string(), "key not found");
        assert_eq!(StoreError::Closed.to_string(), "store is closed");
        assert_eq!(
            StoreError::Timeout(Duration::from_millis(20)).to_string(),
            "timed out after 20ms waiting for reply"
        );
    }

    #[test]
    fn test_is_not_found() {
        assert!(StoreError::NotFound.is_not_found());
        assert!(!StoreError::Closed.is_not_found());
    }
}
