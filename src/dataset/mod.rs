//! Dataset model and registry.
//!
//! This module provides:
//! - The in-memory table model with typed columns
//! - CSV loading with type inference
//! - The process-wide dataset store

pub mod csv;
pub mod store;
pub mod table;

pub use csv::{load_csv_path, load_csv_reader};
pub use store::DatasetStore;
pub use table::{Column, ColumnType, Row, Series, Table, Value};

use std::path::Path;

/// Load every `*.csv` file in `dir` into the store.
///
/// A file that fails to parse (or collides with an existing name) is logged
/// and skipped; preload never aborts startup. Returns the number of datasets
/// loaded.
pub fn preload_datasets(store: &DatasetStore, dir: impl AsRef<Path>) -> usize {
    let dir = dir.as_ref();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Dataset directory {} not readable: {}", dir.display(), e);
            return 0;
        }
    };

    let mut loaded = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("csv") {
            continue;
        }
        match load_csv_path(&path) {
            Ok(table) => {
                let name = table.name().to_string();
                match store.insert(table) {
                    Ok(()) => {
                        tracing::info!("Loaded dataset '{}' from {}", name, path.display());
                        loaded += 1;
                    }
                    Err(e) => tracing::warn!("Skipping {}: {}", path.display(), e),
                }
            }
            Err(e) => tracing::warn!("Failed to load {}: {}", path.display(), e),
        }
    }
    loaded
}
