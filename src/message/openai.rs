//! OpenAI chat completions, also used for OpenAI-compatible APIs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{build_prompt, MessageProvider, CONVENTIONAL_PROMPT, LOCAL_LANGUAGE_PROMPT};
use crate::error::Error;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const ADDIS_BASE_URL: &str = "https://api.addisai.com/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_TOKENS: u32 = 100;
const TEMPERATURE: f32 = 0.3;

const CONVENTIONAL_SYSTEM: &str = "You are a helpful assistant that generates concise, conventional git commit messages based on code diffs.";
const LOCAL_LANGUAGE_SYSTEM: &str = "You are a helpful assistant that generates concise git commit messages based on code diffs. Support local languages when appropriate.";

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: ChatMessage,
}

impl ChatResponse {
    /// Trimmed content of the first choice, if any.
    pub(crate) fn first_text(&self) -> Option<String> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
    }
}

/// Chat-completions provider.
pub struct OpenAiProvider {
    client: Client,
    name: String,
    api_key: String,
    model: String,
    base_url: String,
    system_prompt: &'static str,
    instructions: &'static str,
}

impl OpenAiProvider {
    fn new(name: &str, api_key: String, model: &str, base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self {
            client,
            name: name.to_string(),
            api_key,
            model: model.to_string(),
            base_url: base_url.to_string(),
            system_prompt: CONVENTIONAL_SYSTEM,
            instructions: CONVENTIONAL_PROMPT,
        }
    }

    pub fn openai(api_key: impl Into<String>, model: &str) -> Self {
        Self::new("OpenAI", api_key.into(), model, OPENAI_BASE_URL)
    }

    /// Addis AI speaks the OpenAI protocol and prompts for local languages.
    pub fn addis(api_key: impl Into<String>, model: &str) -> Self {
        let mut provider = Self::new("Addis AI", api_key.into(), model, ADDIS_BASE_URL);
        provider.system_prompt = LOCAL_LANGUAGE_SYSTEM;
        provider.instructions = LOCAL_LANGUAGE_PROMPT;
        provider
    }

    /// Point at another OpenAI-compatible endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    pub(crate) fn build_request<'a>(&'a self, diff: &str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: Some(self.system_prompt.to_string()),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: Some(build_prompt(self.instructions, diff)),
                },
            ],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        }
    }
}

#[async_trait]
impl MessageProvider for OpenAiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, diff: &str) -> Result<String, Error> {
        debug!(provider = %self.name, model = %self.model, "Requesting commit message");
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&self.build_request(diff))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::provider(&self.name, format!("{} - {}", status, body)));
        }

        let body: ChatResponse = response.json().await?;
        body.first_text()
            .ok_or_else(|| Error::provider(&self.name, "empty response"))
    }
}
