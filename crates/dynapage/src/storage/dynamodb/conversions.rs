//! DynamoDB attribute conversion functions.
//!
//! Pure functions for converting between DynamoDB AttributeValue maps and JSON.
//! These are testable in isolation without DynamoDB access.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use serde_json::{Map, Number, Value};
use thiserror::Error;

use super::store::Item;

/// Errors converting JSON input into a DynamoDB item.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("Expected a JSON object, got: {0}")]
    NotAnObject(String),
}

/// Convert a JSON object to a DynamoDB item.
pub fn json_to_item(value: Value) -> Result<Item, ConversionError> {
    match value {
        Value::Object(map) => Ok(map
            .into_iter()
            .map(|(name, value)| (name, json_to_attribute(value)))
            .collect()),
        other => Err(ConversionError::NotAnObject(other.to_string())),
    }
}

/// Convert a JSON value to a DynamoDB attribute.
///
/// Numbers keep their textual form so no precision is lost.
pub fn json_to_attribute(value: Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s),
        Value::Array(values) => {
            AttributeValue::L(values.into_iter().map(json_to_attribute).collect())
        }
        Value::Object(map) => AttributeValue::M(
            map.into_iter()
                .map(|(name, value)| (name, json_to_attribute(value)))
                .collect::<HashMap<_, _>>(),
        ),
    }
}

/// Convert a DynamoDB item to a JSON object.
pub fn item_to_json(item: &Item) -> Value {
    Value::Object(
        item.iter()
            .map(|(name, value)| (name.clone(), attribute_to_json(value)))
            .collect::<Map<_, _>>(),
    )
}

/// Convert a DynamoDB attribute to JSON.
///
/// Binary values become arrays of bytes; sets become arrays.
pub fn attribute_to_json(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::N(n) => number_to_json(n),
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::L(values) => Value::Array(values.iter().map(attribute_to_json).collect()),
        AttributeValue::M(map) => Value::Object(
            map.iter()
                .map(|(name, value)| (name.clone(), attribute_to_json(value)))
                .collect(),
        ),
        AttributeValue::Ss(values) => {
            Value::Array(values.iter().cloned().map(Value::String).collect())
        }
        AttributeValue::Ns(values) => {
            Value::Array(values.iter().map(|n| number_to_json(n)).collect())
        }
        AttributeValue::B(blob) => bytes_to_json(blob.as_ref()),
        AttributeValue::Bs(blobs) => {
            Value::Array(blobs.iter().map(|blob| bytes_to_json(blob.as_ref())).collect())
        }
        _ => Value::Null,
    }
}

fn number_to_json(n: &str) -> Value {
    n.parse::<Number>()
        .map(Value::Number)
        .unwrap_or_else(|_| Value::String(n.to_string()))
}

fn bytes_to_json(bytes: &[u8]) -> Value {
    Value::Array(bytes.iter().map(|b| Value::from(*b)).collect())
}

#[cfg(test)]
mod tests {
    use aws_sdk_dynamodb::primitives::Blob;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_json_object_to_item() {
        let item = json_to_item(json!({
            "pk": "user#1",
            "count": 3,
            "active": true,
            "tags": ["a", "b"],
            "meta": { "nested": null }
        }))
        .unwrap();

        assert_eq!(item.get("pk").unwrap().as_s().unwrap(), "user#1");
        assert_eq!(item.get("count").unwrap().as_n().unwrap(), "3");
        assert!(*item.get("active").unwrap().as_bool().unwrap());
        assert_eq!(item.get("tags").unwrap().as_l().unwrap().len(), 2);
        let meta = item.get("meta").unwrap().as_m().unwrap();
        assert!(meta.get("nested").unwrap().is_null());
    }

    #[test]
    fn test_non_object_is_rejected() {
        let err = json_to_item(json!([1, 2])).unwrap_err();
        assert_eq!(err, ConversionError::NotAnObject("[1,2]".to_string()));
    }

    #[test]
    fn test_item_to_json() {
        let mut item = Item::new();
        item.insert("pk".to_string(), AttributeValue::S("user#1".to_string()));
        item.insert("score".to_string(), AttributeValue::N("12.5".to_string()));
        item.insert(
            "colors".to_string(),
            AttributeValue::Ss(vec!["red".to_string(), "blue".to_string()]),
        );
        item.insert("raw".to_string(), AttributeValue::B(Blob::new(vec![1, 2])));

        assert_eq!(
            item_to_json(&item),
            json!({
                "pk": "user#1",
                "score": 12.5,
                "colors": ["red", "blue"],
                "raw": [1, 2]
            })
        );
    }

    #[test]
    fn test_unparseable_number_is_kept_as_string() {
        assert_eq!(
            attribute_to_json(&AttributeValue::N("1e400000".to_string())),
            json!("1e400000")
        );
    }
}
