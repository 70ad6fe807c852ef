//! Chart advisor: asks the backend whether the result is worth plotting.

use serde::Serialize;

use crate::backend::{strip_code_fence, ChatBackend};
use crate::query::ExecutionResult;

const SYSTEM_PROMPT: &str = "You are a data assistant that determines if a result can be \
visualized and suggests a chart type and data points for visualization. Respond with a JSON \
object containing exactly the keys 'chart_type' and 'data_points', or \
{\"chart_type\": null, \"data_points\": null} if no chart is needed. chart_type is a single \
word such as 'bar' or 'line'. Respond with the JSON object only, no markdown.";

/// A chart suggestion. Both fields absent is the canonical "no chart" state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartSuggestion {
    pub chart_type: Option<String>,
    pub data_points: Option<serde_json::Value>,
}

impl ChartSuggestion {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_none(&self) -> bool {
        self.chart_type.is_none() && self.data_points.is_none()
    }
}

/// Ask the backend for a chart suggestion.
///
/// The answer must be a JSON object with exactly the two expected keys,
/// `chart_type` being a string or null; anything else — transport errors
/// included — yields the empty suggestion.
pub async fn suggest_chart(
    backend: &dyn ChatBackend,
    user_query: &str,
    query: &str,
    result: &ExecutionResult,
) -> ChartSuggestion {
    let result_json = serde_json::to_value(result).unwrap_or_else(|_| serde_json::json!({}));
    let user_prompt = format!(
        "The user asked: {}\n\nThe query used: {}\n\nThe raw result from the query: {}\n\n\
         Suggest a visualization.",
        user_query, query, result_json
    );

    let response = match backend.complete(SYSTEM_PROMPT, &user_prompt).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("Error suggesting chart type: {}", e);
            return ChartSuggestion::none();
        }
    };

    match parse_suggestion(&response) {
        Some(suggestion) => suggestion,
        None => {
            tracing::warn!("Discarding malformed chart suggestion: {}", response);
            ChartSuggestion::none()
        }
    }
}

/// Strict schema validation of the backend's answer.
///
/// Accepts only `{"chart_type": <string|null>, "data_points": <json|null>}`
/// with no extra keys. This replaces the original's unsandboxed structural
/// parse of untrusted text.
fn parse_suggestion(raw: &str) -> Option<ChartSuggestion> {
    let cleaned = strip_code_fence(raw);
    let value: serde_json::Value = serde_json::from_str(cleaned).ok()?;

    let object = value.as_object()?;
    if object.len() != 2 || !object.contains_key("chart_type") || !object.contains_key("data_points")
    {
        return None;
    }

    let chart_type = match &object["chart_type"] {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        _ => return None,
    };
    let data_points = match &object["data_points"] {
        serde_json::Value::Null => None,
        other => Some(other.clone()),
    };

    Some(ChartSuggestion {
        chart_type,
        data_points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_suggestion() {
        let raw = r#"{"chart_type": "bar", "data_points": {"Dust2": 10, "Mirage": 7}}"#;
        let suggestion = parse_suggestion(raw).unwrap();
        assert_eq!(suggestion.chart_type.as_deref(), Some("bar"));
        assert!(suggestion.data_points.is_some());
    }

    #[test]
    fn test_parse_explicit_no_chart() {
        let raw = r#"{"chart_type": null, "data_points": null}"#;
        let suggestion = parse_suggestion(raw).unwrap();
        assert!(suggestion.is_none());
    }

    #[test]
    fn test_parse_fenced_json() {
        let raw = "```json\n{\"chart_type\": \"line\", \"data_points\": null}\n```";
        let suggestion = parse_suggestion(raw).unwrap();
        assert_eq!(suggestion.chart_type.as_deref(), Some("line"));
    }

    #[test]
    fn test_reject_extra_keys() {
        let raw = r#"{"chart_type": "bar", "data_points": null, "title": "Kills"}"#;
        assert!(parse_suggestion(raw).is_none());
    }

    #[test]
    fn test_reject_missing_key() {
        assert!(parse_suggestion(r#"{"chart_type": "bar"}"#).is_none());
    }

    #[test]
    fn test_reject_wrong_chart_type_kind() {
        assert!(parse_suggestion(r#"{"chart_type": 3, "data_points": null}"#).is_none());
    }

    #[test]
    fn test_reject_non_object_and_garbage() {
        assert!(parse_suggestion("[1, 2, 3]").is_none());
        assert!(parse_suggestion("a bar chart would be nice").is_none());
        assert!(parse_suggestion("").is_none());
    }

    #[test]
    fn test_serializes_with_null_fields() {
        let json = serde_json::to_string(&ChartSuggestion::none()).unwrap();
        assert_eq!(json, r#"{"chart_type":null,"data_points":null}"#);
    }
}
