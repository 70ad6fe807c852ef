//! REST API request handlers.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::dataset::{load_csv_reader, DatasetStore};
use crate::error::DatasetError;
use crate::pipeline::{PipelineError, QueryPipeline, QueryRequest};

/// Application state shared across handlers.
pub struct ApiState {
    pub store: Arc<DatasetStore>,
    pub pipeline: Arc<QueryPipeline>,
}

impl ApiState {
    pub fn new(store: Arc<DatasetStore>, pipeline: Arc<QueryPipeline>) -> Self {
        Self { store, pipeline }
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Dataset listing response.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetsResponse {
    pub datasets: Vec<String>,
}

/// Dataset preview response.
#[derive(Debug, Clone, Serialize)]
pub struct PreviewResponse {
    pub dataset_name: String,
    pub columns_summary: String,
    pub columns: Vec<String>,
}

/// Upload response.
#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub dataset_name: String,
}

/// Error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

fn error_response(status: StatusCode, error: impl Into<String>, code: &str) -> axum::response::Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.to_string(),
        }),
    )
        .into_response()
}

// ============================================================================
// Handler Functions
// ============================================================================

/// GET /datasets - List available datasets.
pub async fn list_datasets_handler(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    Json(DatasetsResponse {
        datasets: state.store.names(),
    })
}

/// GET /preview/:dataset_name - Column summary for a dataset.
pub async fn preview_handler(
    State(state): State<Arc<ApiState>>,
    Path(dataset_name): Path<String>,
) -> impl IntoResponse {
    let Some(table) = state.store.get(&dataset_name) else {
        tracing::error!("Dataset '{}' not found for preview.", dataset_name);
        return error_response(StatusCode::NOT_FOUND, "Dataset not found", "not_found");
    };

    let column_descriptions: Vec<String> = table
        .columns()
        .iter()
        .map(|c| format!("'{}' (type: {})", c.name, c.dtype.dtype_name()))
        .collect();
    let columns_summary = format!(
        "The dataset '{}' contains the following columns:\n{}\n\n\
         You can query these columns for analysis or visualization.",
        dataset_name,
        column_descriptions.join("\n")
    );

    (
        StatusCode::OK,
        Json(PreviewResponse {
            dataset_name,
            columns_summary,
            columns: table.column_names(),
        }),
    )
        .into_response()
}

/// POST /upload-dataset - Upload a CSV file as a new dataset.
pub async fn upload_dataset_handler(
    State(state): State<Arc<ApiState>>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let field = match multipart.next_field().await {
        Ok(Some(field)) => field,
        Ok(None) => {
            return error_response(StatusCode::BAD_REQUEST, "No file provided.", "missing_file");
        }
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, e.to_string(), "invalid_multipart");
        }
    };

    let Some(filename) = field.file_name().map(String::from) else {
        return error_response(StatusCode::BAD_REQUEST, "No file provided.", "missing_file");
    };

    let Some(dataset_name) = filename.strip_suffix(".csv").map(String::from) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Only CSV files are supported.",
            "invalid_file_type",
        );
    };

    let data = match field.bytes().await {
        Ok(data) => data,
        Err(e) => {
            tracing::error!("Error reading uploaded file: {}", e);
            return error_response(StatusCode::BAD_REQUEST, e.to_string(), "invalid_multipart");
        }
    };

    let table = match load_csv_reader(dataset_name.clone(), data.as_ref()) {
        Ok(table) => table,
        Err(e) => {
            tracing::error!("Error uploading dataset: {}", e);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "An error occurred while processing the dataset.",
                "parse_failed",
            );
        }
    };

    match state.store.insert(table) {
        Ok(()) => (
            StatusCode::OK,
            Json(UploadResponse {
                message: format!("Dataset '{}' uploaded successfully.", dataset_name),
                dataset_name,
            }),
        )
            .into_response(),
        Err(DatasetError::Duplicate(_)) => error_response(
            StatusCode::BAD_REQUEST,
            "A dataset with this name already exists.",
            "duplicate_name",
        ),
        Err(e) => {
            tracing::error!("Error uploading dataset: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "An error occurred while processing the dataset.",
                "upload_failed",
            )
        }
    }
}

/// POST /query - Run the query pipeline against a dataset.
///
/// Always answers 200 with a fully populated envelope; the only protocol
/// error is an unknown dataset.
pub async fn query_handler(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<QueryRequest>,
) -> impl IntoResponse {
    match state.pipeline.handle(&request, &state.store).await {
        Ok(envelope) => (StatusCode::OK, Json(envelope)).into_response(),
        Err(PipelineError::DatasetNotFound(name)) => {
            tracing::error!("Dataset '{}' not found.", name);
            error_response(StatusCode::NOT_FOUND, "Dataset not found", "not_found")
        }
    }
}
