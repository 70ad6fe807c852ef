//! The query answering pipeline.
//!
//! This module provides:
//! - Query synthesis from natural language
//! - Result humanization
//! - Chart suggestion with strict schema validation
//! - The orchestrator that sequences the steps per request

pub mod chart;
pub mod humanizer;
pub mod orchestrator;
pub mod synthesizer;

pub use chart::{suggest_chart, ChartSuggestion};
pub use humanizer::{humanize, HUMANIZE_FALLBACK};
pub use orchestrator::{
    PipelineError, QueryPipeline, QueryRequest, ResponseEnvelope, QUERY_PLACEHOLDER,
};
pub use synthesizer::synthesize;
