use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use serde_json::Value;

use crate::document::filter::FilterExpression;
use crate::document::item::{Item, ATTR_ID};
use crate::error::{StoreError, StoreResult};
use crate::query::values_equal;

/// Precondition attached to a write.
#[derive(Clone, Debug, PartialEq)]
pub enum WriteCondition {
    /// No item with this key may exist.
    NotExists,
    /// The stored item must hold `value` at `attribute`.
    AttributeEquals { attribute: String, value: Value },
}

/// Result of a conditional write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PutItemOutcome {
    Written,
    ConditionFailed,
}

/// Minimal table-oriented document store: items keyed by their `id`
/// attribute, conditional puts, and filtered scans.
///
/// Implementations must check a [`WriteCondition`] and apply the write as a
/// single atomic step.
pub trait DocumentClient: Send + Sync {
    fn get_item(&self, table: &str, key: &str) -> StoreResult<Option<Item>>;

    fn put_item(
        &self,
        table: &str,
        item: Item,
        condition: &WriteCondition,
    ) -> StoreResult<PutItemOutcome>;

    /// All items in `table` passing `filter`, ordered by key.
    fn scan(&self, table: &str, filter: &FilterExpression) -> StoreResult<Vec<Item>>;
}

/// In-process [`DocumentClient`] holding tables in memory.
#[derive(Debug, Default)]
pub struct MemoryDocumentClient {
    tables: RwLock<HashMap<String, BTreeMap<String, Item>>>,
}

impl MemoryDocumentClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of tables written to so far.
    pub fn tables(&self) -> StoreResult<Vec<String>> {
        let tables = self.tables.read().map_err(StoreError::lock_poisoned)?;
        let mut names: Vec<String> = tables.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

impl DocumentClient for MemoryDocumentClient {
    fn get_item(&self, table: &str, key: &str) -> StoreResult<Option<Item>> {
        let tables = self.tables.read().map_err(StoreError::lock_poisoned)?;
        Ok(tables.get(table).and_then(|items| items.get(key)).cloned())
    }

    fn put_item(
        &self,
        table: &str,
        item: Item,
        condition: &WriteCondition,
    ) -> StoreResult<PutItemOutcome> {
        let key = match item.get(ATTR_ID) {
            Some(Value::String(key)) => key.clone(),
            _ => return Err(StoreError::Serialization("item has no string id".into())),
        };
        let mut tables = self.tables.write().map_err(StoreError::lock_poisoned)?;
        let items = tables.entry(table.to_string()).or_default();
        let current = items.get(&key);
        let holds = match condition {
            WriteCondition::NotExists => current.is_none(),
            WriteCondition::AttributeEquals { attribute, value } => current
                .and_then(|stored| stored.get(attribute))
                .is_some_and(|stored| values_equal(stored, value)),
        };
        if !holds {
            return Ok(PutItemOutcome::ConditionFailed);
        }
        items.insert(key, item);
        Ok(PutItemOutcome::Written)
    }

    fn scan(&self, table: &str, filter: &FilterExpression) -> StoreResult<Vec<Item>> {
        let tables = self.tables.read().map_err(StoreError::lock_poisoned)?;
        Ok(tables
            .get(table)
            .map(|items| {
                items
                    .values()
                    .filter(|item| filter.matches(item))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
