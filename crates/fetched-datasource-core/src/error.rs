//! Error types for fetched-results data sources.
//!
//! Only recoverable conditions are modelled here. Broken caller invariants
//! (double-opened batches, out-of-range lookups, section moves) panic
//! instead, since continuing would desynchronize the visible list from the
//! result set.

use thiserror::Error;

/// Failures reported by the store behind a result set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The fetch request could not be executed.
    #[error("fetch failed: {0}")]
    FetchFailed(String),

    /// Persisting pending changes failed.
    #[error("save failed: {0}")]
    SaveFailed(String),

    /// The entity is not part of the store.
    #[error("object not found in store")]
    ObjectNotFound,

    /// The store rejected an entity during validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The execution context that serializes store access has shut down.
    #[error("store context is closed")]
    Closed,
}

/// Errors returned by data source operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataSourceError {
    /// The underlying store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// An optional capability needed for the operation was not configured.
    #[error("missing capability: {0}")]
    MissingCapability(&'static str),

    /// The widget served by the data source has been released.
    #[error("widget has been released")]
    NoWidget,

    /// A queue refused the work because it has been stopped.
    #[error("queue is no longer accepting work")]
    QueueClosed,

    /// A running queue refused the work because it is at capacity.
    #[error("queue is full")]
    QueueFull,
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A specialized Result type for data source operations.
pub type Result<T> = std::result::Result<T, DataSourceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let err = StoreError::FetchFailed("no such entity".into());
        assert_eq!(err.to_string(), "fetch failed: no such entity");
        assert_eq!(StoreError::Closed.to_string(), "store context is closed");
    }

    #[test]
    fn test_store_error_converts() {
        let err: DataSourceError = StoreError::SaveFailed("disk full".into()).into();
        assert_eq!(
            err,
            DataSourceError::Store(StoreError::SaveFailed("disk full".into()))
        );
        assert_eq!(err.to_string(), "store error: save failed: disk full");
    }
}
