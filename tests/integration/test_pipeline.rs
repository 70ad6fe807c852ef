//! End-to-end pipeline tests with a stubbed backend.

use std::sync::Arc;

use tabula::{
    Column, ColumnType, DatasetStore, ExecutionResult, QueryPipeline, QueryRequest, Table, Value,
    EMPTY_QUERY_ERROR, QUERY_PLACEHOLDER,
};

use crate::stub_backend::StubBackend;

/// The csgo fixture from the end-to-end scenario.
fn store_with_csgo() -> DatasetStore {
    let store = DatasetStore::new();
    store
        .insert(Table::new(
            "csgo",
            vec![
                Column::new("map", ColumnType::Str),
                Column::new("kills", ColumnType::Int),
            ],
            vec![
                vec![Value::Str("Dust2".into()), Value::Int(10)],
                vec![Value::Str("Mirage".into()), Value::Int(7)],
            ],
        ))
        .unwrap();
    store
}

fn request(dataset: &str, user_query: &str) -> QueryRequest {
    QueryRequest {
        dataset_name: dataset.to_string(),
        user_query: user_query.to_string(),
    }
}

#[tokio::test]
async fn test_total_kills_scenario() {
    let backend = Arc::new(StubBackend::new("df['kills'].sum()"));
    let pipeline = QueryPipeline::new(backend.clone(), true, 5);
    let store = store_with_csgo();

    let envelope = pipeline
        .handle(&request("csgo", "total kills"), &store)
        .await
        .unwrap();

    assert_eq!(envelope.query, "df['kills'].sum()");
    assert_eq!(envelope.result, ExecutionResult::scalar(Value::Int(17)));
    assert!(!envelope.humanized_response.is_empty());
    assert!(envelope.visualization.is_none());

    // The synthesis prompt carried the question and a table preview
    let prompts = backend.prompts.lock().unwrap();
    assert!(prompts[0].contains("total kills"));
    assert!(prompts[0].contains("Dust2"));
}

#[tokio::test]
async fn test_identical_requests_yield_identical_results() {
    let store = store_with_csgo();
    let mut results = Vec::new();
    for _ in 0..2 {
        let backend = Arc::new(StubBackend::new("df.groupby('map')['kills'].sum()"));
        let pipeline = QueryPipeline::new(backend, true, 5);
        let envelope = pipeline
            .handle(&request("csgo", "kills per map"), &store)
            .await
            .unwrap();
        results.push(serde_json::to_value(&envelope.result).unwrap());
    }
    assert_eq!(results[0], results[1]);
}

#[tokio::test]
async fn test_failed_synthesis_still_produces_prose() {
    let backend = Arc::new(StubBackend::failing_synthesis());
    let pipeline = QueryPipeline::new(backend.clone(), true, 5);
    let store = store_with_csgo();

    let envelope = pipeline
        .handle(&request("csgo", "total kills"), &store)
        .await
        .unwrap();

    assert_eq!(envelope.query, QUERY_PLACEHOLDER);
    assert_eq!(envelope.result.error_message(), Some(EMPTY_QUERY_ERROR));
    assert!(!envelope.humanized_response.is_empty());
}

#[tokio::test]
async fn test_malformed_chart_answer_yields_empty_suggestion() {
    let backend = Arc::new(
        StubBackend::new("df['kills'].sum()")
            .with_chart(r#"{"chart_type": "bar", "points": [1, 2]}"#),
    );
    let pipeline = QueryPipeline::new(backend, true, 5);
    let store = store_with_csgo();

    let envelope = pipeline
        .handle(&request("csgo", "total kills"), &store)
        .await
        .unwrap();
    assert!(envelope.visualization.is_none());
}

#[tokio::test]
async fn test_well_formed_chart_answer_passes_through() {
    let backend = Arc::new(
        StubBackend::new("df.groupby('map')['kills'].sum()")
            .with_chart(r#"{"chart_type": "bar", "data_points": {"Dust2": 10, "Mirage": 7}}"#),
    );
    let pipeline = QueryPipeline::new(backend, true, 5);
    let store = store_with_csgo();

    let envelope = pipeline
        .handle(&request("csgo", "kills per map"), &store)
        .await
        .unwrap();
    assert_eq!(envelope.visualization.chart_type.as_deref(), Some("bar"));
    assert!(envelope.visualization.data_points.is_some());
}

#[tokio::test]
async fn test_envelope_wire_format() {
    let backend = Arc::new(StubBackend::new("df['kills'].sum()"));
    let pipeline = QueryPipeline::new(backend, true, 5);
    let store = store_with_csgo();

    let envelope = pipeline
        .handle(&request("csgo", "total kills"), &store)
        .await
        .unwrap();
    let json = serde_json::to_value(&envelope).unwrap();

    assert_eq!(json["query"], "df['kills'].sum()");
    assert_eq!(json["result"], serde_json::json!({"value": 17}));
    assert_eq!(
        json["visualization"],
        serde_json::json!({"chart_type": null, "data_points": null})
    );
    assert!(json["humanized_response"].is_string());
}
