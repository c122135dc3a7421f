//! The remote store contract.
//!
//! A store performs exactly one wire call per method and classifies its
//! failures into an [`ErrorKind`]. Retrying and pagination happen above it.

use async_trait::async_trait;
use thiserror::Error;

use crate::keys::CompositeKey;
use crate::request::{PageRequest, QueryRequest, ScanRequest};

/// Result type for a single store call.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// One page of records and the cursor to continue from, if more data exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<R, C> {
    pub items: Vec<R>,
    pub cursor: Option<C>,
}

impl<R, C> Page<R, C> {
    /// A final page.
    pub fn last(items: Vec<R>) -> Self {
        Self {
            items,
            cursor: None,
        }
    }

    /// A page followed by more data starting after `cursor`.
    pub fn more(items: Vec<R>, cursor: C) -> Self {
        Self {
            items,
            cursor: Some(cursor),
        }
    }
}

/// Classification of a store failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request exceeded provisioned throughput. Transient.
    CapacityExceeded,
    Validation,
    AccessDenied,
    NotFound,
    ConditionFailed,
    Network,
    Other,
}

impl ErrorKind {
    /// Only capacity exhaustion is worth retrying.
    pub fn is_retriable(self) -> bool {
        matches!(self, ErrorKind::CapacityExceeded)
    }
}

/// A failure reported by the store, with its structured error code.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct StoreError {
    pub kind: ErrorKind,
    pub code: String,
    pub message: String,
}

impl StoreError {
    pub fn new(kind: ErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn is_retriable(&self) -> bool {
        self.kind.is_retriable()
    }
}

/// A paginated, rate-limited key-value store.
#[async_trait]
pub trait PageStore: Send + Sync {
    /// An opaque record, passed through unmodified.
    type Record: Send + Sync;
    /// An opaque continuation token.
    type Cursor: Clone + Send + Sync;

    /// Fetches one page of a query.
    async fn query_page(
        &self,
        request: &QueryRequest,
        page: &PageRequest<Self::Cursor>,
    ) -> StoreResult<Page<Self::Record, Self::Cursor>>;

    /// Fetches one page of a scan.
    async fn scan_page(
        &self,
        request: &ScanRequest,
        page: &PageRequest<Self::Cursor>,
    ) -> StoreResult<Page<Self::Record, Self::Cursor>>;

    /// Writes a full record, replacing any record with the same key.
    async fn put_record(&self, table: &str, record: &Self::Record) -> StoreResult<()>;

    /// Deletes the record with the given key.
    async fn delete_record(&self, table: &str, key: &CompositeKey) -> StoreResult<()>;
}
