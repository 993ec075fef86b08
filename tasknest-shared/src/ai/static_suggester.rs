/// Suggester with fixed answers
///
/// Returns the configured label and description for every request and
/// counts the calls, so tests can assert whether the AI was consulted.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{AiError, AiResult, LabelSuggester};
use crate::models::task::TaskLabel;

#[derive(Debug, Default)]
pub struct StaticSuggester {
    label: Option<TaskLabel>,
    description: Option<String>,
    fail: bool,
    calls: AtomicUsize,
}

impl StaticSuggester {
    /// Always suggests `label`
    pub fn new(label: Option<TaskLabel>) -> Self {
        Self {
            label,
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Suggester whose every request fails like an unreachable service
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    /// Number of suggestion requests received
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record(&self) -> AiResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AiError::Request("static suggester configured to fail".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl LabelSuggester for StaticSuggester {
    fn name(&self) -> &str {
        "static"
    }

    async fn suggest_label(&self, _title: &str, _description: Option<&str>) -> AiResult<Option<TaskLabel>> {
        self.record()?;
        Ok(self.label)
    }

    async fn suggest_description(&self, _title: &str) -> AiResult<Option<String>> {
        self.record()?;
        Ok(self.description.clone())
    }
}
