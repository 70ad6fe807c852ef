//! Configuration for the Tabula server.

mod settings;

pub use settings::{BackendConfig, Config, DatasetsConfig, PipelineConfig, ServerConfig};
