//! REST API router and configuration.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::api::handlers::{
    list_datasets_handler, preview_handler, query_handler, upload_dataset_handler, ApiState,
};

/// Create the REST API router.
///
/// Endpoints:
/// - GET  /datasets              - List available datasets
/// - GET  /preview/:dataset_name - Column summary for a dataset
/// - POST /upload-dataset        - Upload a CSV file
/// - POST /query                 - Run the query pipeline
///
/// CORS permits all origins, methods, and headers — this serves a
/// browser-facing demo client and is not a security boundary.
pub fn create_router(state: Arc<ApiState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .allow_origin(Any);

    Router::new()
        .route("/datasets", get(list_datasets_handler))
        .route("/preview/:dataset_name", get(preview_handler))
        .route("/upload-dataset", post(upload_dataset_handler))
        .route("/query", post(query_handler))
        .with_state(state)
        .layer(cors)
}
