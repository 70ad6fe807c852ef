//! Scripted stand-in for the text-generation backend.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tabula::{BackendError, ChatBackend};

/// Answers synthesis, humanization, and chart-suggestion calls in request
/// order, recording every prompt it sees.
pub struct StubBackend {
    synthesis: Result<String, String>,
    humanized: String,
    chart: String,
    calls: AtomicUsize,
    pub prompts: Mutex<Vec<String>>,
}

impl StubBackend {
    pub fn new(synthesis: &str) -> Self {
        Self {
            synthesis: Ok(synthesis.to_string()),
            humanized: "Here is what the data says.".to_string(),
            chart: r#"{"chart_type": null, "data_points": null}"#.to_string(),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// A backend whose synthesis call fails (humanize and chart still work).
    pub fn failing_synthesis() -> Self {
        Self {
            synthesis: Err("backend unreachable".to_string()),
            ..Self::new("")
        }
    }

    pub fn with_chart(mut self, chart: &str) -> Self {
        self.chart = chart.to_string();
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatBackend for StubBackend {
    async fn complete(&self, _system: &str, user: &str) -> Result<String, BackendError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(user.to_string());
        match call {
            0 => self
                .synthesis
                .clone()
                .map_err(BackendError::Api),
            1 => Ok(self.humanized.clone()),
            _ => Ok(self.chart.clone()),
        }
    }
}
