//! Backend trait definition.

use async_trait::async_trait;

use crate::error::BackendError;

/// A chat-completion backend.
///
/// One call per invocation; implementations own their timeout. Tests stub
/// this trait to make the pipeline deterministic.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Run one completion with a system instruction and a user message,
    /// returning the assistant's text.
    async fn complete(&self, system: &str, user: &str) -> Result<String, BackendError>;
}
