//! DynamoDB store implementation.
//!
//! This module provides a DynamoDB-based implementation of
//! `dynapage_core::PageStore` using `aws-sdk-dynamodb`.

mod conversions;
mod error;
mod store;

pub use conversions::{
    attribute_to_json, item_to_json, json_to_attribute, json_to_item, ConversionError,
};
pub use error::{classify_code, map_sdk_error, CAPACITY_EXCEEDED_CODE};
pub use store::{key_to_item, DynamoDbStore, Item};
