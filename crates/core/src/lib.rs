//! dynapage_core - paginated, retry-aware access to a remote key-value store.
//!
//! The crate is transport-agnostic: a concrete store implements [`PageStore`]
//! and [`Table`] drives it, absorbing capacity errors with exponential backoff
//! and following continuation cursors until a result set is complete.

pub mod access;
pub mod error;
pub mod keys;
pub mod pagination;
pub mod request;
pub mod retry;
pub mod store;

pub use access::Table;
pub use error::{Error, MalformedKey, Result};
pub use keys::{CompositeKey, KeyPart};
pub use pagination::paginate;
pub use request::{KeyCondition, PageRequest, QueryRequest, ScanRequest, SortOrder};
pub use retry::{retry, BackoffConfig, ExponentialBackoff, RetryError};
pub use store::{ErrorKind, Page, PageStore, StoreError, StoreResult};
