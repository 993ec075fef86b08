/// AI suggestions for tasks
///
/// The [`LabelSuggester`] trait asks a language model which label fits a
/// task, and can draft a description from a title. Two implementations
/// exist:
///
/// - [`OpenAiSuggester`]: any OpenAI-compatible chat completions endpoint
/// - [`StaticSuggester`]: fixed answers, for tests and offline runs
///
/// A reply that is not exactly one known label is treated as "no
/// suggestion", never as an error.
///
/// # Example
///
/// ```no_run
/// use tasknest_shared::ai::{LabelSuggester, OpenAiSuggester, OpenAiConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let suggester = OpenAiSuggester::new(OpenAiConfig::new("sk-..."))?;
///
/// match suggester.suggest_label("Buy milk", None).await? {
///     Some(label) => println!("Suggested: {}", label),
///     None => println!("No suggestion"),
/// }
/// # Ok(())
/// # }
/// ```

mod openai;
mod static_suggester;

pub use openai::{OpenAiConfig, OpenAiSuggester, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use static_suggester::StaticSuggester;

use async_trait::async_trait;

use crate::models::task::TaskLabel;

/// Error type for suggestion requests
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    /// Client could not be built
    #[error("Invalid AI client configuration: {0}")]
    Config(String),

    /// Network failure or timeout
    #[error("AI request failed: {0}")]
    Request(String),

    /// Endpoint answered with a non-success status
    #[error("AI service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body did not have the expected shape
    #[error("Malformed AI response: {0}")]
    InvalidResponse(String),
}

pub type AiResult<T> = Result<T, AiError>;

#[async_trait]
pub trait LabelSuggester: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Proposes a label, `None` if the model gave no usable answer
    async fn suggest_label(&self, title: &str, description: Option<&str>) -> AiResult<Option<TaskLabel>>;

    /// Drafts a short description for a title
    async fn suggest_description(&self, title: &str) -> AiResult<Option<String>>;
}

/// Prompt sent when asking for a label
pub fn label_prompt(title: &str, description: Option<&str>) -> String {
    format!(
        "Based on this task title: \"{}\" and description: \"{}\", suggest ONE of these labels: \
         work, personal, priority, shopping, home. Reply with just the label word and nothing else.",
        title,
        description.unwrap_or_default()
    )
}

/// Prompt sent when asking for a description
pub fn description_prompt(title: &str) -> String {
    format!(
        "Write a short, one-sentence description for a to-do task titled \"{}\". \
         Reply with just the description and nothing else.",
        title
    )
}

/// Interprets a completion as a label
pub fn parse_label_reply(reply: &str) -> Option<TaskLabel> {
    TaskLabel::parse(reply)
}

/// Interprets a completion as a description, dropping wrapping quotes
pub fn parse_description_reply(reply: &str) -> Option<String> {
    let trimmed = reply.trim().trim_matches('"').trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
