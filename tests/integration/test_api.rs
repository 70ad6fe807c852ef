//! Router-level tests for the HTTP surface.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use tabula::{
    create_router, ApiState, Column, ColumnType, DatasetStore, QueryPipeline, Table, Value,
};

use crate::stub_backend::StubBackend;

fn csgo_table() -> Table {
    Table::new(
        "csgo",
        vec![
            Column::new("map", ColumnType::Str),
            Column::new("kills", ColumnType::Int),
        ],
        vec![
            vec![Value::Str("Dust2".into()), Value::Int(10)],
            vec![Value::Str("Mirage".into()), Value::Int(7)],
        ],
    )
}

fn make_app(backend: Arc<StubBackend>) -> (axum::Router, Arc<DatasetStore>) {
    let store = Arc::new(DatasetStore::new());
    store.insert(csgo_table()).unwrap();
    let pipeline = Arc::new(QueryPipeline::new(backend, true, 5));
    let state = Arc::new(ApiState::new(store.clone(), pipeline));
    (create_router(state), store)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn multipart_csv(filename: &str, content: &str) -> Request<Body> {
    let boundary = "test-boundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
         Content-Type: text/csv\r\n\r\n\
         {content}\r\n\
         --{boundary}--\r\n"
    );
    Request::builder()
        .method("POST")
        .uri("/upload-dataset")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_list_datasets() {
    let (app, _) = make_app(Arc::new(StubBackend::new("df")));
    let response = app
        .oneshot(Request::get("/datasets").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json, serde_json::json!({"datasets": ["csgo"]}));
}

#[tokio::test]
async fn test_preview_known_dataset() {
    let (app, _) = make_app(Arc::new(StubBackend::new("df")));
    let response = app
        .oneshot(Request::get("/preview/csgo").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["dataset_name"], "csgo");
    assert_eq!(json["columns"], serde_json::json!(["map", "kills"]));
    let summary = json["columns_summary"].as_str().unwrap();
    assert!(summary.contains("'map' (type: object)"));
    assert!(summary.contains("'kills' (type: int64)"));
}

#[tokio::test]
async fn test_preview_unknown_dataset_is_404() {
    let (app, _) = make_app(Arc::new(StubBackend::new("df")));
    let response = app
        .oneshot(Request::get("/preview/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_query_end_to_end() {
    let backend = Arc::new(StubBackend::new("df['kills'].sum()"));
    let (app, _) = make_app(backend);

    let request = Request::post("/query")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            r#"{"dataset_name": "csgo", "user_query": "total kills"}"#,
        ))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["query"], "df['kills'].sum()");
    assert_eq!(json["result"], serde_json::json!({"value": 17}));
    assert_ne!(json["humanized_response"], "");
}

#[tokio::test]
async fn test_query_unknown_dataset_is_404_and_runs_nothing() {
    let backend = Arc::new(StubBackend::new("df"));
    let (app, _) = make_app(backend.clone());

    let request = Request::post("/query")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            r#"{"dataset_name": "nope", "user_query": "anything"}"#,
        ))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn test_upload_and_requery() {
    let (app, store) = make_app(Arc::new(StubBackend::new("df")));

    let response = app
        .oneshot(multipart_csv("twitch.csv", "streamer,viewers\nA,100\nB,50"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["dataset_name"], "twitch");
    assert_eq!(json["message"], "Dataset 'twitch' uploaded successfully.");

    // The new table is registered alongside the preloaded one
    assert_eq!(store.names(), vec!["csgo", "twitch"]);
    assert_eq!(store.get("twitch").unwrap().row_count(), 2);
}

#[tokio::test]
async fn test_upload_rejects_non_csv() {
    let (app, store) = make_app(Arc::new(StubBackend::new("df")));
    let response = app
        .oneshot(multipart_csv("data.xlsx", "not,a,csv"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(store.names(), vec!["csgo"]);
}

#[tokio::test]
async fn test_upload_duplicate_name_keeps_original() {
    let (app, store) = make_app(Arc::new(StubBackend::new("df")));
    let response = app
        .oneshot(multipart_csv("csgo.csv", "other,columns\n1,2"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "A dataset with this name already exists.");

    // The original table was not overwritten
    let table = store.get("csgo").unwrap();
    assert_eq!(table.column_names(), vec!["map", "kills"]);
    assert_eq!(table.row_count(), 2);
}
