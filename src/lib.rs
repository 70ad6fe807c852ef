//! Tabula: natural-language question answering over tabular datasets.
//!
//! Questions are translated into a closed query grammar by a text-generation
//! backend, parsed and executed against in-memory tables, and answered with
//! a layered envelope: raw result, plain-language explanation, and an
//! optional chart suggestion.

pub mod api;
pub mod backend;
pub mod config;
pub mod dataset;
pub mod error;
pub mod pipeline;
pub mod query;

pub use api::{create_router, ApiState};
pub use backend::{ChatBackend, OpenAiChatClient};
pub use config::Config;
pub use dataset::{
    load_csv_path, load_csv_reader, preload_datasets, Column, ColumnType, DatasetStore, Row,
    Series, Table, Value,
};
pub use error::{
    BackendError, ConfigError, DatasetError, QueryError, Result, TabulaError,
};
pub use pipeline::{
    ChartSuggestion, PipelineError, QueryPipeline, QueryRequest, ResponseEnvelope,
    QUERY_PLACEHOLDER,
};
pub use query::{ExecutionResult, EMPTY_QUERY_ERROR, EXECUTION_ERROR};
