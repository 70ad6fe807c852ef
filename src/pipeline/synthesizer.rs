//! Query synthesizer: natural language in, query expression out.

use crate::backend::{strip_code_fence, ChatBackend};
use crate::dataset::Table;

/// System instruction constraining the backend to the closed query grammar.
///
/// The allowed forms mirror what the parser accepts; anything else the
/// backend emits will be rejected at parse time anyway.
const SYSTEM_PROMPT: &str = "You are a data assistant that generates only table queries based on \
user input, over a table named df. Respond with the query only. Do not include explanations, \
additional text, or formatting like markdown. You may only use these forms: df, df['col'], \
df[['a', 'b']], df[df['col'] == value] with comparison operators ==, !=, >, >=, <, <= and \
predicates combined with & or | over parenthesized terms, .sum(), .mean(), .median(), .min(), \
.max(), .count(), .nunique(), df.groupby('key')['col'].sum() and the other aggregates, \
.sort_values('col') with optional ascending=False, .head(n), df['col'].unique(), \
df['col'].value_counts(), and len(df).";

/// Ask the backend to translate `user_query` into a query expression against
/// `table`.
///
/// Returns the bare expression string, or the empty string on any backend
/// failure so the pipeline can still explain the failure downstream.
pub async fn synthesize(
    backend: &dyn ChatBackend,
    user_query: &str,
    table: &Table,
    preview_rows: usize,
) -> String {
    let user_prompt = format!(
        "Query: {}. Data preview: {}",
        user_query,
        table.preview(preview_rows)
    );

    match backend.complete(SYSTEM_PROMPT, &user_prompt).await {
        Ok(response) => strip_code_fence(&response).to_string(),
        Err(e) => {
            tracing::error!("Error generating query with backend: {}", e);
            String::new()
        }
    }
}
