//! Dataset registry: named in-memory tables.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::dataset::table::Table;
use crate::error::DatasetError;

/// Process-wide registry of named tables.
///
/// Tables are inserted on load/upload and never mutated afterwards; there is
/// no delete path. Insertion checks for duplicates and inserts under a single
/// write lock, so concurrent uploads of the same name cannot both succeed.
#[derive(Default)]
pub struct DatasetStore {
    tables: RwLock<HashMap<String, Arc<Table>>>,
}

impl DatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a table, rejecting duplicate names.
    pub fn insert(&self, table: Table) -> Result<(), DatasetError> {
        let mut tables = self.tables.write();
        if tables.contains_key(table.name()) {
            return Err(DatasetError::Duplicate(table.name().to_string()));
        }
        tables.insert(table.name().to_string(), Arc::new(table));
        Ok(())
    }

    /// Look up a table by name.
    pub fn get(&self, name: &str) -> Option<Arc<Table>> {
        self.tables.read().get(name).cloned()
    }

    /// Sorted list of registered dataset names.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.tables.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::table::{Column, ColumnType, Value};

    fn table(name: &str) -> Table {
        Table::new(
            name,
            vec![Column::new("n", ColumnType::Int)],
            vec![vec![Value::Int(1)]],
        )
    }

    #[test]
    fn test_insert_and_get() {
        let store = DatasetStore::new();
        store.insert(table("csgo")).unwrap();
        assert!(store.get("csgo").is_some());
        assert!(store.get("twitch").is_none());
    }

    #[test]
    fn test_duplicate_insert_rejected_and_original_kept() {
        let store = DatasetStore::new();
        store
            .insert(Table::new(
                "csgo",
                vec![Column::new("n", ColumnType::Int)],
                vec![vec![Value::Int(1)], vec![Value::Int(2)]],
            ))
            .unwrap();

        let err = store.insert(table("csgo")).unwrap_err();
        assert!(matches!(err, DatasetError::Duplicate(_)));
        // The original table is untouched
        assert_eq!(store.get("csgo").unwrap().row_count(), 2);
    }

    #[test]
    fn test_names_sorted_and_unique() {
        let store = DatasetStore::new();
        store.insert(table("twitch")).unwrap();
        store.insert(table("csgo")).unwrap();
        assert_eq!(store.names(), vec!["csgo", "twitch"]);
    }

    #[test]
    fn test_concurrent_inserts_of_same_name() {
        let store = Arc::new(DatasetStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || store.insert(table("csgo")).is_ok())
            })
            .collect();
        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(successes, 1);
        assert_eq!(store.len(), 1);
    }
}
