//! In-memory store implementation.

mod store;

pub use store::{Call, InMemoryStore, Item, KeySchema};
