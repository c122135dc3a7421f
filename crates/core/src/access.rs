//! Table access: the public read and write operations.
//!
//! Each operation parses its keys up front, then runs every wire call through
//! [`retry`] and every multi-page read through [`paginate`]. Callers receive
//! either the full result set or a single [`Error`] naming the operation.

use tokio::time::Instant;

use crate::error::{Error, MalformedKey, Result};
use crate::keys::{CompositeKey, KeyPart};
use crate::pagination::paginate;
use crate::request::{KeyCondition, QueryRequest, ScanRequest};
use crate::retry::{retry, BackoffConfig, RetryError};
use crate::store::PageStore;

pub const GET_ITEMS: &str = "GetItems";
pub const GET_INDEX_ITEMS: &str = "GetIndexItems";
pub const SCAN_ITEMS: &str = "ScanItems";
pub const PUT_ITEM: &str = "PutItem";
pub const DELETE_ITEM: &str = "DeleteItem";

/// Retry-aware, pagination-hiding access to a [`PageStore`].
///
/// Holds no per-call state, so independent calls may run concurrently.
#[derive(Debug, Clone)]
pub struct Table<S> {
    store: S,
    backoff: BackoffConfig,
}

impl<S: PageStore> Table<S> {
    /// Creates a table accessor with the default backoff schedule.
    pub fn new(store: S) -> Self {
        Self::with_backoff(store, BackoffConfig::default())
    }

    /// Creates a table accessor with a custom backoff schedule.
    pub fn with_backoff(store: S, backoff: BackoffConfig) -> Self {
        Self { store, backoff }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn backoff(&self) -> &BackoffConfig {
        &self.backoff
    }

    /// Reads the records of a partition in descending sort order.
    ///
    /// `partition` and `sort` are `attribute:value` strings. An empty `sort`
    /// reads the whole partition; otherwise its value is matched as a prefix.
    pub async fn get_items(
        &self,
        table: &str,
        partition: &str,
        sort: &str,
        limit: Option<u32>,
    ) -> Result<Vec<S::Record>> {
        let key = CompositeKey::parse(partition, sort).map_err(|e| invalid_key(GET_ITEMS, e))?;
        self.get_items_by_key(table, &key, limit).await
    }

    /// Same as [`get_items`](Self::get_items) with an already-built key.
    pub async fn get_items_by_key(
        &self,
        table: &str,
        key: &CompositeKey,
        limit: Option<u32>,
    ) -> Result<Vec<S::Record>> {
        let request = QueryRequest::new(table, KeyCondition::for_key(key)).with_limit(limit);
        self.query(GET_ITEMS, &request).await
    }

    /// Reads every record whose `key_attr` equals `value` in a secondary index.
    pub async fn get_index_items(
        &self,
        table: &str,
        index: &str,
        key_attr: &str,
        value: &str,
    ) -> Result<Vec<S::Record>> {
        let condition = KeyCondition::IndexEquals(KeyPart::new(key_attr, value));
        let request = QueryRequest::new(table, condition).with_index(index);
        self.query(GET_INDEX_ITEMS, &request).await
    }

    /// Reads every record of a table, up to `limit`.
    pub async fn scan_items(&self, table: &str, limit: Option<u32>) -> Result<Vec<S::Record>> {
        let started = Instant::now();
        let request = ScanRequest::new(table).with_limit(limit);
        let (store, backoff, request) = (&self.store, &self.backoff, &request);

        let result = paginate(request.limit, move |page| async move {
            retry(backoff, || store.scan_page(request, &page)).await
        })
        .await;

        finish(SCAN_ITEMS, table, started, result)
    }

    /// Writes a full record.
    pub async fn put_item(&self, table: &str, record: &S::Record) -> Result<()> {
        let started = Instant::now();
        let result = retry(&self.backoff, || self.store.put_record(table, record)).await;
        finish(PUT_ITEM, table, started, result)
    }

    /// Deletes a record. An empty `sort` deletes by partition key alone.
    pub async fn delete_item(&self, table: &str, partition: &str, sort: &str) -> Result<()> {
        let key = CompositeKey::parse(partition, sort).map_err(|e| invalid_key(DELETE_ITEM, e))?;
        self.delete_item_by_key(table, &key).await
    }

    /// Same as [`delete_item`](Self::delete_item) with an already-built key.
    pub async fn delete_item_by_key(&self, table: &str, key: &CompositeKey) -> Result<()> {
        let started = Instant::now();
        let result = retry(&self.backoff, || self.store.delete_record(table, key)).await;
        finish(DELETE_ITEM, table, started, result)
    }

    async fn query(
        &self,
        operation: &'static str,
        request: &QueryRequest,
    ) -> Result<Vec<S::Record>> {
        let started = Instant::now();
        let (store, backoff) = (&self.store, &self.backoff);

        let result = paginate(request.limit, move |page| async move {
            retry(backoff, || store.query_page(request, &page)).await
        })
        .await;

        finish(operation, &request.table, started, result)
    }
}

fn invalid_key(operation: &'static str, source: MalformedKey) -> Error {
    tracing::debug!(operation, input = %source.input, "Rejected malformed key");
    Error::InvalidKey { operation, source }
}

fn finish<T>(
    operation: &'static str,
    table: &str,
    started: Instant,
    result: std::result::Result<T, RetryError>,
) -> Result<T> {
    let elapsed = started.elapsed();
    match result {
        Ok(value) => {
            tracing::debug!(
                operation,
                table,
                elapsed_ms = elapsed.as_millis() as u64,
                "Succeeded"
            );
            Ok(value)
        }
        Err(RetryError::Terminal(source)) => {
            tracing::debug!(operation, table, error = %source, "Failed");
            Err(Error::Remote { operation, source })
        }
        Err(RetryError::Exhausted { attempts, last }) => {
            tracing::warn!(
                operation,
                table,
                attempts,
                elapsed_ms = elapsed.as_millis() as u64,
                "Retries exhausted"
            );
            Err(Error::RetryExhausted {
                operation,
                elapsed,
                attempts,
                source: last,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::request::PageRequest;
    use crate::store::{ErrorKind, Page, StoreError, StoreResult};

    /// Serves `records` in fixed-size pages and replays injected errors per page.
    #[derive(Default)]
    struct ScriptedStore {
        records: Vec<u32>,
        page_size: usize,
        faults: Mutex<HashMap<usize, VecDeque<StoreError>>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedStore {
        fn new(total: u32, page_size: usize) -> Self {
            Self {
                records: (0..total).rev().collect(),
                page_size,
                ..Default::default()
            }
        }

        fn fail_page(self, start: usize, errors: Vec<StoreError>) -> Self {
            self.faults.lock().unwrap().insert(start, errors.into());
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn page(&self, op: &str, page: &PageRequest<usize>) -> StoreResult<Page<u32, usize>> {
            let start = page.start.unwrap_or(0);
            self.calls.lock().unwrap().push(format!("{op}@{start}"));
            if let Some(err) = self
                .faults
                .lock()
                .unwrap()
                .get_mut(&start)
                .and_then(VecDeque::pop_front)
            {
                return Err(err);
            }

            let size = page
                .limit
                .map_or(self.page_size, |limit| self.page_size.min(limit as usize));
            let end = (start + size).min(self.records.len());
            let items = self.records[start..end].to_vec();
            Ok(if end < self.records.len() {
                Page::more(items, end)
            } else {
                Page::last(items)
            })
        }

        fn write(&self, op: String) -> StoreResult<()> {
            self.calls.lock().unwrap().push(op);
            match self.faults.lock().unwrap().get_mut(&0).and_then(VecDeque::pop_front) {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl PageStore for ScriptedStore {
        type Record = u32;
        type Cursor = usize;

        async fn query_page(
            &self,
            request: &QueryRequest,
            page: &PageRequest<usize>,
        ) -> StoreResult<Page<u32, usize>> {
            self.page(&request.condition.expression(), page)
        }

        async fn scan_page(
            &self,
            _request: &ScanRequest,
            page: &PageRequest<usize>,
        ) -> StoreResult<Page<u32, usize>> {
            self.page("scan", page)
        }

        async fn put_record(&self, table: &str, record: &u32) -> StoreResult<()> {
            self.write(format!("put {table} {record}"))
        }

        async fn delete_record(&self, table: &str, key: &CompositeKey) -> StoreResult<()> {
            let parts: Vec<_> = key.attributes().map(|(a, v)| format!("{a}={v}")).collect();
            self.write(format!("delete {table} {}", parts.join(",")))
        }
    }

    fn throttled() -> StoreError {
        StoreError::new(
            ErrorKind::CapacityExceeded,
            "ProvisionedThroughputExceededException",
            "slow down",
        )
    }

    fn table(store: ScriptedStore) -> Table<ScriptedStore> {
        Table::with_backoff(store, BackoffConfig::fast())
    }

    #[test]
    fn test_new_uses_default_backoff() {
        let table = Table::new(ScriptedStore::new(0, 1));

        assert_eq!(table.backoff(), &BackoffConfig::default());
        assert_eq!(
            Table::with_backoff(ScriptedStore::new(0, 1), BackoffConfig::fast()).backoff(),
            &BackoffConfig::fast()
        );
    }

    #[tokio::test]
    async fn test_get_items_reads_all_pages() {
        let table = table(ScriptedStore::new(7, 3));
        let items = table.get_items("t", "pk:1", "", None).await.unwrap();

        assert_eq!(items, vec![6, 5, 4, 3, 2, 1, 0]);
        assert_eq!(
            table.store().calls(),
            vec!["pk = :pk@0", "pk = :pk@3", "pk = :pk@6"]
        );
    }

    #[tokio::test]
    async fn test_get_items_with_sort_uses_prefix_condition() {
        let table = table(ScriptedStore::new(2, 5));
        table.get_items("t", "pk:1", "sk:2024", None).await.unwrap();

        assert_eq!(
            table.store().calls(),
            vec!["pk = :pk AND begins_with(sk, :sk)@0"]
        );
    }

    #[tokio::test]
    async fn test_capacity_error_retries_only_the_failed_page() {
        let table = table(ScriptedStore::new(9, 3).fail_page(3, vec![throttled()]));
        let items = table.scan_items("t", None).await.unwrap();

        assert_eq!(items, (0..9).rev().collect::<Vec<_>>());
        assert_eq!(
            table.store().calls(),
            vec!["scan@0", "scan@3", "scan@3", "scan@6"]
        );
    }

    #[tokio::test]
    async fn test_terminal_error_returns_no_records() {
        let denied = StoreError::new(ErrorKind::Validation, "ValidationException", "bad");
        let table = table(ScriptedStore::new(9, 3).fail_page(6, vec![denied.clone()]));
        let err = table.get_items("t", "pk:1", "", None).await.unwrap_err();

        assert_eq!(
            err,
            Error::Remote {
                operation: GET_ITEMS,
                source: denied,
            }
        );
        assert_eq!(table.store().calls().len(), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_reports_elapsed_and_last_error() {
        let store = ScriptedStore::new(3, 3).fail_page(0, vec![throttled(); 10]);
        let table = Table::with_backoff(
            store,
            BackoffConfig {
                max_attempts: Some(3),
                ..BackoffConfig::fast()
            },
        );
        let err = table
            .get_index_items("t", "gsi1", "email", "a@b.c")
            .await
            .unwrap_err();

        match &err {
            Error::RetryExhausted {
                operation,
                elapsed,
                attempts,
                source,
            } => {
                assert_eq!(*operation, GET_INDEX_ITEMS);
                assert_eq!(*attempts, 3);
                assert!(*elapsed >= Duration::from_millis(3));
                assert_eq!(source, &throttled());
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
        assert!(err.to_string().starts_with("GetIndexItems failed after "));
        assert_eq!(table.store().calls(), vec!["email = :v@0"; 3]);
    }

    #[tokio::test]
    async fn test_malformed_key_fails_before_any_call() {
        let table = table(ScriptedStore::new(3, 3));

        let err = table.get_items("t", "pk123", "", None).await.unwrap_err();
        assert_eq!(err.operation(), GET_ITEMS);
        assert!(matches!(err, Error::InvalidKey { .. }));

        let err = table.delete_item("t", "pk:1", "sk456").await.unwrap_err();
        assert_eq!(err.operation(), DELETE_ITEM);

        assert!(table.store().calls().is_empty());
    }

    #[tokio::test]
    async fn test_delete_builds_key_from_given_parts() {
        let table = table(ScriptedStore::new(0, 1));
        table.delete_item("t", "pk:123", "").await.unwrap();
        table.delete_item("t", "pk:123", "sk:456").await.unwrap();

        assert_eq!(
            table.store().calls(),
            vec!["delete t pk=123", "delete t pk=123,sk=456"]
        );
    }

    #[tokio::test]
    async fn test_put_retries_capacity_errors() {
        let table = table(ScriptedStore::new(0, 1).fail_page(0, vec![throttled(), throttled()]));
        table.put_item("t", &42).await.unwrap();

        assert_eq!(table.store().calls(), vec!["put t 42"; 3]);
    }

    #[tokio::test]
    async fn test_put_surfaces_terminal_error_with_operation() {
        let denied = StoreError::new(ErrorKind::AccessDenied, "AccessDeniedException", "no");
        let table = table(ScriptedStore::new(0, 1).fail_page(0, vec![denied]));
        let err = table.put_item("t", &1).await.unwrap_err();

        assert_eq!(err.to_string(), "PutItem failed: AccessDeniedException: no");
    }
}
