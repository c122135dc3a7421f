//! Read request descriptions handed to a [`PageStore`](crate::PageStore).

use crate::keys::{CompositeKey, KeyPart};

pub const PARTITION_PLACEHOLDER: &str = ":pk";
pub const SORT_PLACEHOLDER: &str = ":sk";
pub const INDEX_PLACEHOLDER: &str = ":v";

/// Order in which a query returns records within a partition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

impl SortOrder {
    /// Whether the store should walk the sort key forward.
    pub fn is_forward(self) -> bool {
        matches!(self, SortOrder::Ascending)
    }
}

/// Condition on key attributes for a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyCondition {
    /// Partition attribute equals a value.
    Equals(KeyPart),
    /// Partition attribute equals a value and the sort attribute starts with a prefix.
    BeginsWith {
        partition: KeyPart,
        sort_prefix: KeyPart,
    },
    /// Key attribute of a secondary index equals a value.
    IndexEquals(KeyPart),
}

impl KeyCondition {
    /// Builds the condition for a primary-key read. A sort part becomes a prefix match.
    pub fn for_key(key: &CompositeKey) -> Self {
        match key.sort() {
            Some(sort) => KeyCondition::BeginsWith {
                partition: key.partition().clone(),
                sort_prefix: sort.clone(),
            },
            None => KeyCondition::Equals(key.partition().clone()),
        }
    }

    /// Key condition expression, e.g. `pk = :pk AND begins_with(sk, :sk)`.
    pub fn expression(&self) -> String {
        match self {
            KeyCondition::Equals(partition) => {
                format!("{} = {PARTITION_PLACEHOLDER}", partition.attribute())
            }
            KeyCondition::BeginsWith {
                partition,
                sort_prefix,
            } => format!(
                "{} = {PARTITION_PLACEHOLDER} AND begins_with({}, {SORT_PLACEHOLDER})",
                partition.attribute(),
                sort_prefix.attribute()
            ),
            KeyCondition::IndexEquals(part) => {
                format!("{} = {INDEX_PLACEHOLDER}", part.attribute())
            }
        }
    }

    /// Placeholder bindings referenced by [`expression`](Self::expression).
    pub fn values(&self) -> Vec<(&'static str, &str)> {
        match self {
            KeyCondition::Equals(partition) => vec![(PARTITION_PLACEHOLDER, partition.value())],
            KeyCondition::BeginsWith {
                partition,
                sort_prefix,
            } => vec![
                (PARTITION_PLACEHOLDER, partition.value()),
                (SORT_PLACEHOLDER, sort_prefix.value()),
            ],
            KeyCondition::IndexEquals(part) => vec![(INDEX_PLACEHOLDER, part.value())],
        }
    }
}

/// Treats a zero limit as no limit.
pub fn normalize_limit(limit: Option<u32>) -> Option<u32> {
    limit.filter(|limit| *limit > 0)
}

/// A query against a table or one of its secondary indexes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub table: String,
    pub index: Option<String>,
    pub condition: KeyCondition,
    pub limit: Option<u32>,
    pub order: SortOrder,
}

impl QueryRequest {
    pub fn new(table: impl Into<String>, condition: KeyCondition) -> Self {
        Self {
            table: table.into(),
            index: None,
            condition,
            limit: None,
            order: SortOrder::default(),
        }
    }

    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.index = Some(index.into());
        self
    }

    pub fn with_limit(mut self, limit: Option<u32>) -> Self {
        self.limit = normalize_limit(limit);
        self
    }

    pub fn with_order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }
}

/// A full-table scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    pub table: String,
    pub limit: Option<u32>,
}

impl ScanRequest {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: Option<u32>) -> Self {
        self.limit = normalize_limit(limit);
        self
    }
}

/// Per-page parameters: where to resume and how many records are still wanted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest<C> {
    /// Exclusive start position returned by the previous page.
    pub start: Option<C>,
    /// Remaining record budget, `None` when unlimited.
    pub limit: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_only_condition() {
        let key = CompositeKey::parse("pk:123", "").unwrap();
        let condition = KeyCondition::for_key(&key);

        assert_eq!(condition.expression(), "pk = :pk");
        assert_eq!(condition.values(), vec![(":pk", "123")]);
    }

    #[test]
    fn test_sort_part_is_prefix_match() {
        let key = CompositeKey::parse("pk:user#1", "sk:order#2024").unwrap();
        let condition = KeyCondition::for_key(&key);

        assert_eq!(
            condition.expression(),
            "pk = :pk AND begins_with(sk, :sk)"
        );
        assert_eq!(
            condition.values(),
            vec![(":pk", "user#1"), (":sk", "order#2024")]
        );
    }

    #[test]
    fn test_index_condition() {
        let condition = KeyCondition::IndexEquals(KeyPart::new("email", "a@b.c"));

        assert_eq!(condition.expression(), "email = :v");
        assert_eq!(condition.values(), vec![(":v", "a@b.c")]);
    }

    #[test]
    fn test_query_defaults_to_descending() {
        let request = QueryRequest::new("t", KeyCondition::Equals(KeyPart::new("pk", "1")));

        assert_eq!(request.order, SortOrder::Descending);
        assert!(!request.order.is_forward());
        assert!(request.index.is_none());
        assert!(request.limit.is_none());
    }

    #[test]
    fn test_zero_limit_means_unlimited() {
        assert_eq!(ScanRequest::new("t").with_limit(Some(0)).limit, None);
        assert_eq!(ScanRequest::new("t").with_limit(Some(5)).limit, Some(5));
        assert_eq!(normalize_limit(None), None);
    }
}
