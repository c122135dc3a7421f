//! Store implementations.
//!
//! # Feature Flags
//!
//! - `dynamodb` (default): AWS DynamoDB store using `aws-sdk-dynamodb`
//! - `inmemory` (default): in-memory store with fault injection, for tests
//!
//! Both can be enabled at the same time.

#[cfg(feature = "dynamodb")]
pub mod dynamodb;

#[cfg(feature = "inmemory")]
pub mod inmemory;

#[cfg(feature = "dynamodb")]
pub use dynamodb::DynamoDbStore;

#[cfg(feature = "inmemory")]
pub use inmemory::InMemoryStore;
