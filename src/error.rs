//! Error types for the Tabula server.

use thiserror::Error;

/// Main error type for Tabula operations.
#[derive(Error, Debug)]
pub enum TabulaError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Configuration-related errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Dataset-related errors (loading, registry).
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Dataset not found: {0}")]
    NotFound(String),

    #[error("A dataset named '{0}' already exists")]
    Duplicate(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFile(String),

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Empty dataset: {0}")]
    Empty(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Text-generation backend errors.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("API key not provided and OPENAI_API_KEY env var not set")]
    MissingApiKey,

    #[error("API error: {0}")]
    Api(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Empty completion")]
    EmptyCompletion,
}

/// Query grammar and evaluation errors.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Parse error at {position}: {message}")]
    Parse { position: usize, message: String },

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl QueryError {
    pub fn parse(position: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            position,
            message: message.into(),
        }
    }
}

/// Result type alias for Tabula operations.
pub type Result<T> = std::result::Result<T, TabulaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TabulaError::Config(ConfigError::MissingField("backend.model".to_string()));
        assert!(err.to_string().contains("backend.model"));
    }

    #[test]
    fn test_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TabulaError = io_err.into();
        assert!(matches!(err, TabulaError::Io(_)));
    }

    #[test]
    fn test_query_parse_error() {
        let err = QueryError::parse(7, "expected a quoted column name");
        assert!(err.to_string().contains("at 7"));
    }
}
