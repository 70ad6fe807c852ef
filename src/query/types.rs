//! Shared types for the query pipeline.

use serde::Serialize;

use crate::dataset::{Row, Series, Value};

/// The normalized outcome of executing a synthesized query.
///
/// Serializes untagged into the wire shapes the original system emitted:
/// a row-mapping array, an index → value object, `{"value": ...}`, or
/// `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExecutionResult {
    Rows(Vec<Row>),
    Series(Series),
    Scalar { value: Value },
    Error { error: String },
}

impl ExecutionResult {
    pub fn scalar(value: Value) -> Self {
        Self::Scalar { value }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// The error message, when this is the error variant.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error { error } => Some(error),
            _ => None,
        }
    }
}
