//! dynapage - paginated, throttling-tolerant access to DynamoDB tables.
//!
//! The retry and pagination engine lives in `dynapage_core`; this crate
//! provides the stores it drives and the environment configuration.

pub mod config;
pub mod storage;

pub use config::Config;
pub use dynapage_core::{
    BackoffConfig, CompositeKey, Error, ErrorKind, KeyPart, PageStore, Result, StoreError, Table,
};
