/// OpenAI-compatible chat completions client

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::{
    description_prompt, label_prompt, parse_description_reply, parse_label_reply, AiError,
    AiResult, LabelSuggester,
};
use crate::models::task::TaskLabel;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

const TEMPERATURE: f32 = 0.3;
const LABEL_MAX_TOKENS: u32 = 16;
const DESCRIPTION_MAX_TOKENS: u32 = 64;

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,

    /// API root without trailing slash, e.g. `https://api.openai.com/v1`
    pub base_url: String,

    pub model: String,

    pub timeout: Duration,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// Suggester backed by a chat completions endpoint
#[derive(Debug, Clone)]
pub struct OpenAiSuggester {
    http: Client,
    config: OpenAiConfig,
}

impl OpenAiSuggester {
    pub fn new(config: OpenAiConfig) -> AiResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("tasknest/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AiError::Config(e.to_string()))?;

        Ok(Self { http, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    /// Sends a single-message prompt and returns the first choice's text
    ///
    /// A response without choices is an error; a choice without text is `None`.
    async fn complete(&self, prompt: &str, max_tokens: u32) -> AiResult<Option<String>> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: TEMPERATURE,
            max_tokens,
        };

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "Chat completion request failed");
            return Err(AiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AiError::InvalidResponse(e.to_string()))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AiError::InvalidResponse("response has no choices".to_string()))?;

        Ok(choice.message.content)
    }
}

#[async_trait]
impl LabelSuggester for OpenAiSuggester {
    fn name(&self) -> &str {
        "openai"
    }

    async fn suggest_label(&self, title: &str, description: Option<&str>) -> AiResult<Option<TaskLabel>> {
        let reply = self
            .complete(&label_prompt(title, description), LABEL_MAX_TOKENS)
            .await?;

        let label = reply.as_deref().and_then(parse_label_reply);
        debug!(reply = ?reply, label = ?label, "AI label suggestion");
        Ok(label)
    }

    async fn suggest_description(&self, title: &str) -> AiResult<Option<String>> {
        let reply = self
            .complete(&description_prompt(title), DESCRIPTION_MAX_TOKENS)
            .await?;

        Ok(reply.as_deref().and_then(parse_description_reply))
    }
}

fn map_reqwest_error(e: reqwest::Error) -> AiError {
    if e.is_timeout() {
        AiError::Request("request timed out".to_string())
    } else {
        AiError::Request(e.to_string())
    }
}
