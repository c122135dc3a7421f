use std::time::Duration;

use thiserror::Error;

use crate::store::StoreError;

/// Result type for table operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A key part string that is not of the form `attribute:value`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Malformed key part '{input}': expected 'attribute:value'")]
pub struct MalformedKey {
    pub input: String,
}

/// Errors returned by [`Table`](crate::Table) operations.
///
/// Every variant carries the name of the operation that failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// The caller supplied a key that could not be parsed. No request was sent.
    #[error("{operation} failed: {source}")]
    InvalidKey {
        operation: &'static str,
        #[source]
        source: MalformedKey,
    },
    /// The store rejected the request with a non-retriable error.
    #[error("{operation} failed: {source}")]
    Remote {
        operation: &'static str,
        #[source]
        source: StoreError,
    },
    /// The store kept reporting capacity exhaustion until the backoff gave up.
    #[error("{operation} failed after {elapsed:?} ({attempts} attempts): {source}")]
    RetryExhausted {
        operation: &'static str,
        elapsed: Duration,
        attempts: u32,
        #[source]
        source: StoreError,
    },
}

impl Error {
    /// Name of the operation that failed.
    pub fn operation(&self) -> &'static str {
        match self {
            Error::InvalidKey { operation, .. }
            | Error::Remote { operation, .. }
            | Error::RetryExhausted { operation, .. } => operation,
        }
    }

    /// The underlying store error, if the failure came from the store.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            Error::InvalidKey { .. } => None,
            Error::Remote { source, .. } | Error::RetryExhausted { source, .. } => Some(source),
        }
    }
}
