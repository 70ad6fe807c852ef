//! CSV loading with per-column type inference.

use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;

use crate::dataset::table::{Column, ColumnType, Table, Value};
use crate::error::DatasetError;

/// Load a CSV file into a [`Table`], deriving the dataset name from the file
/// stem.
pub fn load_csv_path(path: impl AsRef<Path>) -> Result<Table, DatasetError> {
    let path = path.as_ref();
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| DatasetError::UnsupportedFile(path.display().to_string()))?
        .to_string();
    let file = std::fs::File::open(path)?;
    load_csv_reader(name, file)
}

/// Parse CSV data into a [`Table`].
///
/// Column types are inferred from the full column contents: all-integer
/// columns become `int64`, numeric columns `float64`, `True`/`False` columns
/// `bool`, everything else `object`. Empty cells become nulls.
pub fn load_csv_reader(name: impl Into<String>, reader: impl Read) -> Result<Table, DatasetError> {
    let name = name.into();
    let mut csv_reader = ReaderBuilder::new().has_headers(true).from_reader(reader);

    let headers: Vec<String> = csv_reader.headers()?.iter().map(String::from).collect();
    if headers.is_empty() {
        return Err(DatasetError::Empty(name));
    }

    let mut records: Vec<Vec<String>> = Vec::new();
    for result in csv_reader.records() {
        let record = result?;
        records.push(record.iter().map(String::from).collect());
    }

    let dtypes: Vec<ColumnType> = (0..headers.len())
        .map(|col| infer_column_type(records.iter().map(|r| r.get(col).map(String::as_str))))
        .collect();

    let rows: Vec<Vec<Value>> = records
        .iter()
        .map(|record| {
            dtypes
                .iter()
                .enumerate()
                .map(|(col, dtype)| parse_cell(record.get(col).map(String::as_str), *dtype))
                .collect()
        })
        .collect();

    let columns = headers
        .into_iter()
        .zip(dtypes)
        .map(|(name, dtype)| Column::new(name, dtype))
        .collect();

    Ok(Table::new(name, columns, rows))
}

fn infer_column_type<'a>(values: impl Iterator<Item = Option<&'a str>>) -> ColumnType {
    let mut all_int = true;
    let mut all_float = true;
    let mut all_bool = true;
    let mut saw_value = false;

    for value in values.flatten() {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            continue;
        }
        saw_value = true;
        if all_int && trimmed.parse::<i64>().is_err() {
            all_int = false;
        }
        if all_float && trimmed.parse::<f64>().is_err() {
            all_float = false;
        }
        if all_bool && parse_bool(trimmed).is_none() {
            all_bool = false;
        }
    }

    if !saw_value {
        return ColumnType::Str;
    }
    if all_int {
        ColumnType::Int
    } else if all_float {
        ColumnType::Float
    } else if all_bool {
        ColumnType::Bool
    } else {
        ColumnType::Str
    }
}

fn parse_cell(raw: Option<&str>, dtype: ColumnType) -> Value {
    let trimmed = match raw {
        Some(s) => s.trim(),
        None => return Value::Null,
    };
    if trimmed.is_empty() {
        return Value::Null;
    }
    match dtype {
        ColumnType::Int => trimmed.parse().map(Value::Int).unwrap_or(Value::Null),
        ColumnType::Float => trimmed.parse().map(Value::Float).unwrap_or(Value::Null),
        ColumnType::Bool => parse_bool(trimmed).map(Value::Bool).unwrap_or(Value::Null),
        ColumnType::Str => Value::Str(trimmed.to_string()),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}
