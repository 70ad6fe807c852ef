//! Pipeline orchestrator.
//!
//! Sequences synthesize → execute → humanize → suggest-chart for one request
//! and assembles the response envelope. Every step still runs when an earlier
//! one degraded to its soft-failure value; only an unknown dataset short-
//! circuits.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::ChatBackend;
use crate::config::Config;
use crate::dataset::DatasetStore;
use crate::query::{self, ExecutionResult};

use super::chart::{suggest_chart, ChartSuggestion};
use super::humanizer::humanize;
use super::synthesizer::synthesize;

/// Envelope text when synthesis produced no query.
pub const QUERY_PLACEHOLDER: &str = "There was an issue generating the query.";

/// One inbound question about one dataset.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    pub dataset_name: String,
    pub user_query: String,
}

/// The layered response returned to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseEnvelope {
    pub query: String,
    pub result: ExecutionResult,
    pub humanized_response: String,
    pub visualization: ChartSuggestion,
}

/// The only pipeline failure that surfaces as a protocol error.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Dataset not found")]
    DatasetNotFound(String),
}

/// The query pipeline, shared across requests.
pub struct QueryPipeline {
    backend: Arc<dyn ChatBackend>,
    suggest_charts: bool,
    preview_rows: usize,
}

impl QueryPipeline {
    pub fn new(backend: Arc<dyn ChatBackend>, suggest_charts: bool, preview_rows: usize) -> Self {
        Self {
            backend,
            suggest_charts,
            preview_rows,
        }
    }

    pub fn from_config(config: &Config, backend: Arc<dyn ChatBackend>) -> Self {
        Self::new(
            backend,
            config.pipeline.suggest_charts,
            config.dataset_preview_rows(),
        )
    }

    /// Run the full pipeline for one request.
    pub async fn handle(
        &self,
        request: &QueryRequest,
        store: &DatasetStore,
    ) -> Result<ResponseEnvelope, PipelineError> {
        tracing::info!(
            "Received query for dataset: {} with query: {}",
            request.dataset_name,
            request.user_query
        );

        let table = store
            .get(&request.dataset_name)
            .ok_or_else(|| PipelineError::DatasetNotFound(request.dataset_name.clone()))?;

        let query = synthesize(
            self.backend.as_ref(),
            &request.user_query,
            &table,
            self.preview_rows,
        )
        .await;

        let result = query::execute(&query, &table);

        let humanized_response =
            humanize(self.backend.as_ref(), &request.user_query, &query, &result).await;

        let visualization = if self.suggest_charts {
            suggest_chart(self.backend.as_ref(), &request.user_query, &query, &result).await
        } else {
            ChartSuggestion::none()
        };

        Ok(ResponseEnvelope {
            query: if query.is_empty() {
                QUERY_PLACEHOLDER.to_string()
            } else {
                query
            },
            result,
            humanized_response,
            visualization,
        })
    }
}
