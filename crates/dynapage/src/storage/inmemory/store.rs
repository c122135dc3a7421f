//! In-memory store implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use dynapage_core::{
    CompositeKey, ErrorKind, KeyCondition, KeyPart, Page, PageRequest, PageStore, QueryRequest,
    ScanRequest, StoreError, StoreResult,
};
use serde_json::{Map, Value};
use tokio::sync::{Mutex, RwLock};

/// A record: a JSON object keyed by attribute name.
pub type Item = Map<String, Value>;

const DEFAULT_PAGE_SIZE: usize = 100;

/// Key attributes of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySchema {
    pub partition: String,
    pub sort: Option<String>,
}

impl KeySchema {
    pub fn new(partition: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            sort: None,
        }
    }

    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }
}

/// A store call, as recorded by [`InMemoryStore::calls`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Query { table: String, start: Option<usize> },
    Scan { table: String, start: Option<usize> },
    Put { table: String },
    Delete { table: String },
}

#[derive(Debug)]
struct MemoryTable {
    schema: KeySchema,
    indexes: HashMap<String, KeySchema>,
    items: Vec<Item>,
}

/// In-memory storage backend for testing.
///
/// Splits results into pages of a fixed size, using the offset into the
/// matching records as the continuation cursor. Every call is recorded, and
/// errors can be scheduled for a specific call number.
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    tables: Arc<RwLock<HashMap<String, MemoryTable>>>,
    faults: Arc<Mutex<HashMap<usize, StoreError>>>,
    calls: Arc<Mutex<Vec<Call>>>,
    page_size: usize,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Creates a new empty store with the default page size.
    pub fn new() -> Self {
        Self {
            tables: Arc::new(RwLock::new(HashMap::new())),
            faults: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Sets the maximum number of records per page.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Creates an empty table.
    pub async fn create_table(&self, name: &str, schema: KeySchema) {
        self.tables.write().await.insert(
            name.to_string(),
            MemoryTable {
                schema,
                indexes: HashMap::new(),
                items: Vec::new(),
            },
        );
    }

    /// Adds a secondary index to an existing table.
    pub async fn create_index(
        &self,
        table: &str,
        index: &str,
        schema: KeySchema,
    ) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let table = tables.get_mut(table).ok_or_else(|| table_not_found(table))?;
        table.indexes.insert(index.to_string(), schema);
        Ok(())
    }

    /// Makes the `call`-th store call (zero-based, across all operations) fail with `error`.
    pub async fn fail_call(&self, call: usize, error: StoreError) {
        self.faults.lock().await.insert(call, error);
    }

    /// Calls made so far, in order.
    pub async fn calls(&self) -> Vec<Call> {
        self.calls.lock().await.clone()
    }

    /// Records a call and returns the fault scheduled for it, if any.
    async fn record(&self, call: Call) -> StoreResult<()> {
        let mut calls = self.calls.lock().await;
        let number = calls.len();
        calls.push(call);
        match self.faults.lock().await.remove(&number) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn page(&self, matching: Vec<&Item>, page: &PageRequest<usize>) -> Page<Item, usize> {
        let start = page.start.unwrap_or(0).min(matching.len());
        let size = page
            .limit
            .map_or(self.page_size, |limit| self.page_size.min(limit as usize));
        let end = (start + size).min(matching.len());
        let items = matching[start..end].iter().map(|item| (*item).clone()).collect();

        if end < matching.len() {
            Page::more(items, end)
        } else {
            Page::last(items)
        }
    }
}

fn table_not_found(table: &str) -> StoreError {
    StoreError::new(
        ErrorKind::NotFound,
        "ResourceNotFoundException",
        format!("Requested resource not found: Table: {table} not found"),
    )
}

fn validation(message: impl Into<String>) -> StoreError {
    StoreError::new(ErrorKind::Validation, "ValidationException", message)
}

/// String form of a scalar attribute.
fn scalar(item: &Item, attribute: &str) -> Option<String> {
    match item.get(attribute)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn equals(item: &Item, part: &KeyPart) -> bool {
    scalar(item, part.attribute()).as_deref() == Some(part.value())
}

fn matches(item: &Item, condition: &KeyCondition) -> bool {
    match condition {
        KeyCondition::Equals(part) | KeyCondition::IndexEquals(part) => equals(item, part),
        KeyCondition::BeginsWith {
            partition,
            sort_prefix,
        } => {
            equals(item, partition)
                && scalar(item, sort_prefix.attribute())
                    .is_some_and(|value| value.starts_with(sort_prefix.value()))
        }
    }
}

fn same_key(a: &Item, b: &Item, schema: &KeySchema) -> bool {
    std::iter::once(&schema.partition)
        .chain(schema.sort.as_ref())
        .all(|attribute| scalar(a, attribute) == scalar(b, attribute))
}

fn check_condition(schema: &KeySchema, condition: &KeyCondition) -> StoreResult<()> {
    let (partition, sort) = match condition {
        KeyCondition::Equals(part) | KeyCondition::IndexEquals(part) => (part, None),
        KeyCondition::BeginsWith {
            partition,
            sort_prefix,
        } => (partition, Some(sort_prefix)),
    };

    let partition_ok = partition.attribute() == schema.partition;
    let sort_ok = match sort {
        Some(sort) => schema.sort.as_deref() == Some(sort.attribute()),
        None => true,
    };
    if partition_ok && sort_ok {
        Ok(())
    } else {
        Err(validation("Query condition missed key schema element"))
    }
}

#[async_trait]
impl PageStore for InMemoryStore {
    type Record = Item;
    type Cursor = usize;

    async fn query_page(
        &self,
        request: &QueryRequest,
        page: &PageRequest<usize>,
    ) -> StoreResult<Page<Item, usize>> {
        self.record(Call::Query {
            table: request.table.clone(),
            start: page.start,
        })
        .await?;

        let tables = self.tables.read().await;
        let table = tables
            .get(&request.table)
            .ok_or_else(|| table_not_found(&request.table))?;
        let schema = match &request.index {
            Some(index) => table.indexes.get(index).ok_or_else(|| {
                validation(format!("The table does not have the specified index: {index}"))
            })?,
            None => &table.schema,
        };
        check_condition(schema, &request.condition)?;

        let mut matching: Vec<&Item> = table
            .items
            .iter()
            .filter(|item| matches(item, &request.condition))
            .collect();
        if let Some(sort) = &schema.sort {
            matching.sort_by_key(|item| scalar(item, sort));
        }
        if !request.order.is_forward() {
            matching.reverse();
        }

        Ok(self.page(matching, page))
    }

    async fn scan_page(
        &self,
        request: &ScanRequest,
        page: &PageRequest<usize>,
    ) -> StoreResult<Page<Item, usize>> {
        self.record(Call::Scan {
            table: request.table.clone(),
            start: page.start,
        })
        .await?;

        let tables = self.tables.read().await;
        let table = tables
            .get(&request.table)
            .ok_or_else(|| table_not_found(&request.table))?;

        Ok(self.page(table.items.iter().collect(), page))
    }

    async fn put_record(&self, table: &str, record: &Item) -> StoreResult<()> {
        self.record(Call::Put {
            table: table.to_string(),
        })
        .await?;

        let mut tables = self.tables.write().await;
        let stored = tables.get_mut(table).ok_or_else(|| table_not_found(table))?;
        let schema = stored.schema.clone();

        let has_keys = std::iter::once(&schema.partition)
            .chain(schema.sort.as_ref())
            .all(|attribute| scalar(record, attribute).is_some());
        if !has_keys {
            return Err(validation(
                "One or more parameter values were invalid: Missing the key in the item",
            ));
        }

        match stored
            .items
            .iter_mut()
            .find(|existing| same_key(existing, record, &schema))
        {
            Some(existing) => *existing = record.clone(),
            None => stored.items.push(record.clone()),
        }
        Ok(())
    }

    async fn delete_record(&self, table: &str, key: &CompositeKey) -> StoreResult<()> {
        self.record(Call::Delete {
            table: table.to_string(),
        })
        .await?;

        let mut tables = self.tables.write().await;
        let stored = tables.get_mut(table).ok_or_else(|| table_not_found(table))?;
        let schema = stored.schema.clone();

        let key_attributes: Vec<&str> = key.attributes().map(|(name, _)| name).collect();
        let schema_attributes: Vec<&str> = std::iter::once(schema.partition.as_str())
            .chain(schema.sort.as_deref())
            .collect();
        if key_attributes != schema_attributes {
            return Err(validation(
                "The provided key element does not match the schema",
            ));
        }

        stored.items.retain(|item| {
            !key
                .attributes()
                .all(|(name, value)| scalar(item, name).as_deref() == Some(value))
        });
        Ok(())
    }
}
