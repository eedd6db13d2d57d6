use std::fmt;

use ng_core::{Error, GenerationClient, GenerationError, GenerationOptions, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{classify_status, classify_transport};

pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com/v1";
pub const DEEPSEEK_MODEL: &str = "deepseek-chat";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const OPENAI_MODEL: &str = "gpt-4o-mini";

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
}

/// Client for any chat-completions endpoint that speaks the OpenAI dialect.
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    label: &'static str,
}

impl fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl OpenAiClient {
    pub fn new(
        api_key: Option<String>,
        base_url: Option<String>,
        model: Option<String>,
    ) -> Result<Self> {
        Self::build(
            "OpenAI",
            api_key,
            base_url.unwrap_or_else(|| OPENAI_BASE_URL.to_string()),
            model.unwrap_or_else(|| OPENAI_MODEL.to_string()),
        )
    }

    pub fn deepseek(api_key: Option<String>, base_url: Option<String>) -> Result<Self> {
        Self::build(
            "DeepSeek",
            api_key,
            base_url.unwrap_or_else(|| DEEPSEEK_BASE_URL.to_string()),
            DEEPSEEK_MODEL.to_string(),
        )
    }

    fn build(
        label: &'static str,
        api_key: Option<String>,
        base_url: String,
        model: String,
    ) -> Result<Self> {
        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::InvalidInput(format!("{} API key is required", label)))?;
        Ok(Self {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            label,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait::async_trait]
impl GenerationClient for OpenAiClient {
    fn name(&self) -> &str {
        self.label
    }

    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> std::result::Result<String, GenerationError> {
        let request = ChatRequest {
            model: options.model.as_deref().unwrap_or(&self.model),
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status.as_u16(), &body));
        }

        let response: ChatResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Transient(format!("malformed completion: {}", e)))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| GenerationError::Transient("completion had no content".to_string()))
    }
}
