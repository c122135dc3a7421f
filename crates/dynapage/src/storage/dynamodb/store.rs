//! DynamoDB store implementation.
//!
//! Implements `PageStore` from `dynapage_core` with one SDK call per method.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;

use dynapage_core::{
    CompositeKey, Page, PageRequest, PageStore, QueryRequest, ScanRequest, StoreResult,
};

use super::error::map_sdk_error;
use crate::config::Config;

/// A DynamoDB item, also used as the continuation cursor.
pub type Item = HashMap<String, AttributeValue>;

/// DynamoDB-based store.
#[derive(Debug, Clone)]
pub struct DynamoDbStore {
    client: Client,
}

impl DynamoDbStore {
    /// Creates a new store with the given DynamoDB client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Creates a new store from configuration.
    ///
    /// Uses the AWS SDK default credential chain, the configured region and,
    /// when set, a custom endpoint (local DynamoDB).
    pub async fn from_config(config: &Config) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()));

        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;
        Self::new(Client::new(&sdk_config))
    }
}

/// Build the physical key of a record.
pub fn key_to_item(key: &CompositeKey) -> Item {
    key.attributes()
        .map(|(name, value)| (name.to_string(), AttributeValue::S(value.to_string())))
        .collect()
}

/// Clamp a record budget to the SDK's `i32` limit.
fn wire_limit(limit: u32) -> i32 {
    i32::try_from(limit).unwrap_or(i32::MAX)
}

/// DynamoDB may return an empty map instead of omitting the key.
fn cursor(last_evaluated_key: Option<Item>) -> Option<Item> {
    last_evaluated_key.filter(|key| !key.is_empty())
}

#[async_trait]
impl PageStore for DynamoDbStore {
    type Record = Item;
    type Cursor = Item;

    async fn query_page(
        &self,
        request: &QueryRequest,
        page: &PageRequest<Item>,
    ) -> StoreResult<Page<Item, Item>> {
        let mut query = self
            .client
            .query()
            .table_name(&request.table)
            .set_index_name(request.index.clone())
            .key_condition_expression(request.condition.expression())
            .scan_index_forward(request.order.is_forward())
            .set_limit(page.limit.map(wire_limit))
            .set_exclusive_start_key(page.start.clone());

        for (placeholder, value) in request.condition.values() {
            query = query
                .expression_attribute_values(placeholder, AttributeValue::S(value.to_string()));
        }

        let output = query.send().await.map_err(map_sdk_error)?;

        Ok(Page {
            items: output.items.unwrap_or_default(),
            cursor: cursor(output.last_evaluated_key),
        })
    }

    async fn scan_page(
        &self,
        request: &ScanRequest,
        page: &PageRequest<Item>,
    ) -> StoreResult<Page<Item, Item>> {
        let output = self
            .client
            .scan()
            .table_name(&request.table)
            .set_limit(page.limit.map(wire_limit))
            .set_exclusive_start_key(page.start.clone())
            .send()
            .await
            .map_err(map_sdk_error)?;

        Ok(Page {
            items: output.items.unwrap_or_default(),
            cursor: cursor(output.last_evaluated_key),
        })
    }

    async fn put_record(&self, table: &str, record: &Item) -> StoreResult<()> {
        self.client
            .put_item()
            .table_name(table)
            .set_item(Some(record.clone()))
            .send()
            .await
            .map_err(map_sdk_error)?;

        Ok(())
    }

    async fn delete_record(&self, table: &str, key: &CompositeKey) -> StoreResult<()> {
        self.client
            .delete_item()
            .table_name(table)
            .set_key(Some(key_to_item(key)))
            .send()
            .await
            .map_err(map_sdk_error)?;

        Ok(())
    }
}
