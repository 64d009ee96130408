use reqwest::blocking::Client;

use crate::types::{ChatRequest, ChatResponse};
use crate::{ChatError, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

// ─── ChatModel ────────────────────────────────────────────────────────────

/// Anything that turns a chat request into completion text.
///
/// The pipeline only depends on this trait so stages can be driven by a
/// scripted model in tests.
pub trait ChatModel {
    fn complete(&self, request: &ChatRequest) -> Result<String>;
}

// ─── GroqClient ───────────────────────────────────────────────────────────

/// Blocking client for an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct GroqClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl GroqClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ChatError::MissingApiKey);
        }
        Ok(Self {
            http: Client::builder().build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

impl ChatModel for GroqClient {
    fn complete(&self, request: &ChatRequest) -> Result<String> {
        tracing::debug!(model = %request.model, "sending chat completion request");
        let resp = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(request)
            .send()?;

        let status = resp.status();
        let body = resp.text()?;
        if !status.is_success() {
            return Err(ChatError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&body)?;
        parsed
            .first_content()
            .map(str::to_string)
            .ok_or(ChatError::EmptyResponse)
    }
}

impl<M: ChatModel + ?Sized> ChatModel for &M {
    fn complete(&self, request: &ChatRequest) -> Result<String> {
        (**self).complete(request)
    }
}
