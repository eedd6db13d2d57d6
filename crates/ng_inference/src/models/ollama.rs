use std::fmt;

use ng_core::{Error, GenerationClient, GenerationError, GenerationOptions};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{classify_status, classify_transport};

const DEFAULT_URL: &str = "http://localhost:11434/gemma3:12b";
const DEFAULT_MODEL: &str = "gemma3:12b";

#[derive(Debug, Clone, PartialEq)]
pub struct OllamaConfig {
    pub host: String,
    pub port: u16,
    pub model_name: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost".to_string(),
            port: 11434,
            model_name: DEFAULT_MODEL.to_string(),
        }
    }
}

impl OllamaConfig {
    /// Parse `scheme://host:port/model`, e.g. `http://localhost:11434/gemma3:12b`.
    /// A missing port or model falls back to the defaults; an unparsable url
    /// or one without a host is an error.
    pub fn from_url(url: Option<&str>) -> ng_core::Result<Self> {
        let defaults = Self::default();
        let raw = url.unwrap_or(DEFAULT_URL);
        let parsed = Url::parse(raw)
            .map_err(|e| Error::InvalidInput(format!("Invalid Ollama url {:?}: {}", raw, e)))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| Error::InvalidInput(format!("Ollama url {:?} has no host", raw)))?;

        let model_name = parsed.path().trim_start_matches('/').to_string();
        Ok(Self {
            host: format!("{}://{}", parsed.scheme(), host),
            port: parsed.port().unwrap_or(defaults.port),
            model_name: if model_name.is_empty() { defaults.model_name } else { model_name },
        })
    }

    fn endpoint(&self) -> String {
        format!("{}:{}/api/generate", self.host, self.port)
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: ModelOptions,
}

#[derive(Serialize)]
struct ModelOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

pub struct OllamaClient {
    client: Client,
    config: OllamaConfig,
}

impl fmt::Debug for OllamaClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OllamaClient")
            .field("client", &"<reqwest::Client>")
            .field("config", &self.config)
            .finish()
    }
}

impl OllamaClient {
    pub fn new(config: OllamaConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl GenerationClient for OllamaClient {
    fn name(&self) -> &str {
        "Ollama"
    }

    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, GenerationError> {
        let request = GenerateRequest {
            model: options.model.as_deref().unwrap_or(&self.config.model_name),
            prompt,
            stream: false,
            options: ModelOptions {
                temperature: options.temperature,
                num_predict: options.max_tokens,
            },
        };

        let response = self
            .client
            .post(self.config.endpoint())
            .json(&request)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status.as_u16(), &body));
        }

        let response: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Transient(format!("malformed response: {}", e)))?;
        Ok(response.response)
    }
}
