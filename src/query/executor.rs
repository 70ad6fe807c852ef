//! Query executor.
//!
//! Evaluates a parsed query expression against a table and normalizes the
//! outcome. All failures — parse errors, unknown columns, type mismatches —
//! are logged and collapsed into the canonical error result; nothing from
//! the evaluation internals reaches the caller.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::dataset::{Row, Series, Table, Value};
use crate::error::QueryError;

use super::ast::{Aggregate, CmpOp, Expr, Predicate};
use super::parser;
use super::types::ExecutionResult;

/// Error result for an empty synthesized query.
pub const EMPTY_QUERY_ERROR: &str =
    "There was an issue processing your request. Please try again later.";

/// Error result for a query that failed to parse or evaluate.
pub const EXECUTION_ERROR: &str =
    "We couldn't process the data at the moment. Please try again later.";

/// Execute a synthesized query string against a table.
///
/// An empty query means synthesis already failed upstream; it yields the
/// fixed processing-error result without touching the parser. The stored
/// table is never mutated.
pub fn execute(query: &str, table: &Table) -> ExecutionResult {
    if query.is_empty() {
        return ExecutionResult::error(EMPTY_QUERY_ERROR);
    }

    match run(query, table) {
        Ok(result) => result,
        Err(e) => {
            tracing::error!("Error executing query '{}': {}", query, e);
            ExecutionResult::error(EXECUTION_ERROR)
        }
    }
}

fn run(query: &str, table: &Table) -> Result<ExecutionResult, QueryError> {
    let expr = parser::parse(query)?;
    let value = eval(&expr, table)?;
    Ok(normalize(value, table))
}

// ============================================================================
// Evaluation
// ============================================================================

/// Intermediate evaluation value.
#[derive(Debug, Clone)]
enum Eval {
    /// A view over the table: visible rows and columns, in order.
    Frame {
        rows: Vec<usize>,
        cols: Vec<usize>,
    },
    /// A single column: (index label, value) pairs.
    Column(Vec<(String, Value)>),
    Scalar(Value),
}

fn eval(expr: &Expr, table: &Table) -> Result<Eval, QueryError> {
    match expr {
        Expr::Table => Ok(Eval::Frame {
            rows: (0..table.row_count()).collect(),
            cols: (0..table.columns().len()).collect(),
        }),

        Expr::Len(input) => {
            let (rows, _) = eval_frame(input, table)?;
            Ok(Eval::Scalar(Value::Int(rows.len() as i64)))
        }

        Expr::Filter { input, predicate } => {
            let (rows, cols) = eval_frame(input, table)?;
            let kept = rows
                .into_iter()
                .filter_map(|row| match matches(predicate, table, row) {
                    Ok(true) => Some(Ok(row)),
                    Ok(false) => None,
                    Err(e) => Some(Err(e)),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Eval::Frame { rows: kept, cols })
        }

        Expr::Select { input, column } => {
            let (rows, cols) = eval_frame(input, table)?;
            let col = resolve_column(table, &cols, column)?;
            let entries = rows
                .into_iter()
                .map(|row| (row.to_string(), table.value(row, col).clone()))
                .collect();
            Ok(Eval::Column(entries))
        }

        Expr::Project { input, columns } => {
            let (rows, cols) = eval_frame(input, table)?;
            let projected = columns
                .iter()
                .map(|name| resolve_column(table, &cols, name))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Eval::Frame {
                rows,
                cols: projected,
            })
        }

        Expr::SortValues {
            input,
            by,
            ascending,
        } => {
            let (mut rows, cols) = eval_frame(input, table)?;
            let col = resolve_column(table, &cols, by)?;
            // Stable sort; nulls last regardless of direction, as pandas does.
            rows.sort_by(|&a, &b| {
                let va = table.value(a, col);
                let vb = table.value(b, col);
                match (va.is_null(), vb.is_null()) {
                    (true, true) => Ordering::Equal,
                    (true, false) => Ordering::Greater,
                    (false, true) => Ordering::Less,
                    (false, false) => {
                        let ord = va.partial_cmp_value(vb).unwrap_or(Ordering::Equal);
                        if *ascending {
                            ord
                        } else {
                            ord.reverse()
                        }
                    }
                }
            });
            Ok(Eval::Frame { rows, cols })
        }

        Expr::Head { input, n } => {
            let (mut rows, cols) = eval_frame(input, table)?;
            rows.truncate(*n);
            Ok(Eval::Frame { rows, cols })
        }

        Expr::GroupAgg {
            input,
            key,
            column,
            agg,
        } => {
            let (rows, cols) = eval_frame(input, table)?;
            let key_col = resolve_column(table, &cols, key)?;
            let agg_col = resolve_column(table, &cols, column)?;

            // Null group keys are dropped, as pandas does by default.
            let mut groups: Vec<(Value, Vec<Value>)> = Vec::new();
            for row in rows {
                let key_value = table.value(row, key_col);
                if key_value.is_null() {
                    continue;
                }
                let cell = table.value(row, agg_col).clone();
                match groups.iter_mut().find(|(k, _)| k == key_value) {
                    Some((_, values)) => values.push(cell),
                    None => groups.push((key_value.clone(), vec![cell])),
                }
            }
            // Group keys sort ascending (groupby sort=True default).
            groups.sort_by(|(a, _), (b, _)| {
                a.partial_cmp_value(b)
                    .unwrap_or_else(|| a.to_string().cmp(&b.to_string()))
            });

            let entries = groups
                .into_iter()
                .map(|(key_value, values)| {
                    aggregate(*agg, &values).map(|v| (key_value.to_string(), v))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Eval::Column(entries))
        }

        Expr::Agg { input, agg } => {
            let entries = eval_column(input, table)?;
            let values: Vec<Value> = entries.into_iter().map(|(_, v)| v).collect();
            Ok(Eval::Scalar(aggregate(*agg, &values)?))
        }

        Expr::Unique(input) => {
            let entries = eval_column(input, table)?;
            let mut seen: Vec<Value> = Vec::new();
            for (_, value) in entries {
                if !seen.contains(&value) {
                    seen.push(value);
                }
            }
            Ok(Eval::Scalar(Value::List(seen)))
        }

        Expr::ValueCounts(input) => {
            let entries = eval_column(input, table)?;
            let mut counts: Vec<(Value, i64)> = Vec::new();
            for (_, value) in entries {
                if value.is_null() {
                    continue;
                }
                match counts.iter_mut().find(|(v, _)| *v == value) {
                    Some((_, n)) => *n += 1,
                    None => counts.push((value, 1)),
                }
            }
            // Descending by count, stable on first appearance.
            counts.sort_by(|(_, a), (_, b)| b.cmp(a));
            let entries = counts
                .into_iter()
                .map(|(value, n)| (value.to_string(), Value::Int(n)))
                .collect();
            Ok(Eval::Column(entries))
        }
    }
}

fn eval_frame(expr: &Expr, table: &Table) -> Result<(Vec<usize>, Vec<usize>), QueryError> {
    match eval(expr, table)? {
        Eval::Frame { rows, cols } => Ok((rows, cols)),
        _ => Err(QueryError::InvalidOperation(
            "operation requires a table expression".to_string(),
        )),
    }
}

fn eval_column(expr: &Expr, table: &Table) -> Result<Vec<(String, Value)>, QueryError> {
    match eval(expr, table)? {
        Eval::Column(entries) => Ok(entries),
        _ => Err(QueryError::InvalidOperation(
            "operation requires a column expression".to_string(),
        )),
    }
}

fn resolve_column(table: &Table, visible: &[usize], name: &str) -> Result<usize, QueryError> {
    let col = table
        .column_index(name)
        .ok_or_else(|| QueryError::UnknownColumn(name.to_string()))?;
    if !visible.contains(&col) {
        return Err(QueryError::UnknownColumn(name.to_string()));
    }
    Ok(col)
}

// ============================================================================
// Predicates
// ============================================================================

fn matches(predicate: &Predicate, table: &Table, row: usize) -> Result<bool, QueryError> {
    match predicate {
        Predicate::And(left, right) => {
            Ok(matches(left, table, row)? && matches(right, table, row)?)
        }
        Predicate::Or(left, right) => {
            Ok(matches(left, table, row)? || matches(right, table, row)?)
        }
        Predicate::Compare {
            column,
            op,
            literal,
        } => {
            let col = table
                .column_index(column)
                .ok_or_else(|| QueryError::UnknownColumn(column.to_string()))?;
            let cell = table.value(row, col);
            Ok(compare(cell, *op, literal))
        }
    }
}

fn compare(cell: &Value, op: CmpOp, literal: &Value) -> bool {
    // Null comparisons: only equality against None is meaningful.
    if cell.is_null() || literal.is_null() {
        return match op {
            CmpOp::Eq => cell.is_null() && literal.is_null(),
            CmpOp::Ne => cell.is_null() != literal.is_null(),
            _ => false,
        };
    }
    match cell.partial_cmp_value(literal) {
        Some(ord) => match op {
            CmpOp::Eq => ord == Ordering::Equal,
            CmpOp::Ne => ord != Ordering::Equal,
            CmpOp::Gt => ord == Ordering::Greater,
            CmpOp::Ge => ord != Ordering::Less,
            CmpOp::Lt => ord == Ordering::Less,
            CmpOp::Le => ord != Ordering::Greater,
        },
        // Incomparable kinds: unequal, never ordered.
        None => matches!(op, CmpOp::Ne),
    }
}

// ============================================================================
// Aggregates
// ============================================================================

fn aggregate(agg: Aggregate, values: &[Value]) -> Result<Value, QueryError> {
    match agg {
        Aggregate::Count => Ok(Value::Int(
            values.iter().filter(|v| !v.is_null()).count() as i64
        )),

        Aggregate::Nunique => {
            let mut seen: Vec<&Value> = Vec::new();
            for value in values.iter().filter(|v| !v.is_null()) {
                if !seen.contains(&value) {
                    seen.push(value);
                }
            }
            Ok(Value::Int(seen.len() as i64))
        }

        Aggregate::Sum => {
            let nums = numeric_values(values)?;
            let all_int = values
                .iter()
                .all(|v| matches!(v, Value::Int(_) | Value::Null));
            if all_int {
                Ok(Value::Int(nums.iter().map(|n| *n as i64).sum()))
            } else {
                Ok(Value::Float(nums.iter().sum()))
            }
        }

        Aggregate::Mean => {
            let nums = numeric_values(values)?;
            if nums.is_empty() {
                return Ok(Value::Null);
            }
            Ok(Value::Float(nums.iter().sum::<f64>() / nums.len() as f64))
        }

        Aggregate::Median => {
            let mut nums = numeric_values(values)?;
            if nums.is_empty() {
                return Ok(Value::Null);
            }
            nums.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
            let mid = nums.len() / 2;
            let median = if nums.len() % 2 == 0 {
                (nums[mid - 1] + nums[mid]) / 2.0
            } else {
                nums[mid]
            };
            Ok(Value::Float(median))
        }

        Aggregate::Min | Aggregate::Max => {
            let mut best: Option<&Value> = None;
            for value in values.iter().filter(|v| !v.is_null()) {
                best = match best {
                    None => Some(value),
                    Some(current) => {
                        let ord = value.partial_cmp_value(current).ok_or_else(|| {
                            QueryError::TypeMismatch(
                                "cannot order mixed value kinds".to_string(),
                            )
                        })?;
                        let take = match agg {
                            Aggregate::Min => ord == Ordering::Less,
                            _ => ord == Ordering::Greater,
                        };
                        if take {
                            Some(value)
                        } else {
                            Some(current)
                        }
                    }
                };
            }
            Ok(best.cloned().unwrap_or(Value::Null))
        }
    }
}

/// Non-null values as f64, failing on any non-numeric value.
fn numeric_values(values: &[Value]) -> Result<Vec<f64>, QueryError> {
    values
        .iter()
        .filter(|v| !v.is_null())
        .map(|v| {
            v.as_f64().ok_or_else(|| {
                QueryError::TypeMismatch(format!("'{}' is not numeric", v))
            })
        })
        .collect()
}

// ============================================================================
// Normalization
// ============================================================================

fn normalize(value: Eval, table: &Table) -> ExecutionResult {
    match value {
        Eval::Frame { rows, cols } => {
            let columns: Arc<[String]> = cols
                .iter()
                .map(|&c| table.columns()[c].name.clone())
                .collect::<Vec<_>>()
                .into();
            let rows = rows
                .into_iter()
                .map(|row| {
                    let values = cols.iter().map(|&c| table.value(row, c).clone()).collect();
                    Row::new(columns.clone(), values)
                })
                .collect();
            ExecutionResult::Rows(rows)
        }
        Eval::Column(entries) => ExecutionResult::Series(Series::new(entries)),
        Eval::Scalar(value) => ExecutionResult::scalar(value),
    }
}
