//! Response humanizer: explains a query result in plain language.

use crate::backend::ChatBackend;
use crate::query::ExecutionResult;

/// Fallback prose when the backend cannot produce an explanation.
pub const HUMANIZE_FALLBACK: &str =
    "We encountered an issue generating the response. Please try again later.";

const SYSTEM_PROMPT: &str = "You are a data assistant that explains data analysis results in \
simple terms for non-technical users.";

/// Produce a plain-language explanation of `result`.
///
/// An error result is first collapsed to `{"value": <message>}` and described
/// as if it were data. Always returns prose; backend failures yield the fixed
/// fallback string.
pub async fn humanize(
    backend: &dyn ChatBackend,
    user_query: &str,
    query: &str,
    result: &ExecutionResult,
) -> String {
    let described = match result.error_message() {
        Some(message) => serde_json::json!({ "value": message }),
        None => serde_json::to_value(result).unwrap_or_else(|_| serde_json::json!({})),
    };

    let user_prompt = format!(
        "The user asked: {}\n\nThe query used: {}\n\nThe raw result from the query: {}\n\n\
         Explain the result in simple and human-friendly terms.",
        user_query, query, described
    );

    match backend.complete(SYSTEM_PROMPT, &user_prompt).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("Error generating humanized response with backend: {}", e);
            HUMANIZE_FALLBACK.to_string()
        }
    }
}
