use std::sync::Arc;

use ng_core::{Error, GenerationClient, GenerationError, Result};

use crate::Config;

pub mod dummy;
pub mod ollama;
pub mod openai;
pub mod scripted;

pub use dummy::DummyClient;
pub use ollama::{OllamaClient, OllamaConfig};
pub use openai::OpenAiClient;
pub use scripted::ScriptedClient;

pub const AVAILABLE_MODELS: &[&str] = &["dummy", "deepseek", "openai", "ollama"];

pub fn create_client(config: &Config) -> Result<Arc<dyn GenerationClient>> {
    let client: Arc<dyn GenerationClient> = match config.model.as_str() {
        "dummy" => Arc::new(DummyClient::new()),
        "deepseek" => Arc::new(OpenAiClient::deepseek(
            config.api_key.clone(),
            config.model_url.clone(),
        )?),
        "openai" => Arc::new(OpenAiClient::new(
            config.api_key.clone(),
            config.model_url.clone(),
            config.pipeline.generation.model.clone(),
        )?),
        "ollama" => Arc::new(OllamaClient::new(OllamaConfig::from_url(
            config.model_url.as_deref(),
        )?)),
        other => {
            return Err(Error::InvalidInput(format!(
                "Unknown model: {}. Available models: {}",
                other,
                AVAILABLE_MODELS.join(", ")
            )))
        }
    };
    tracing::debug!("Created generation client {:?}", client);
    Ok(client)
}

/// Map an unsuccessful HTTP status to a generation error.
pub(crate) fn classify_status(status: u16, body: &str) -> GenerationError {
    let message = format!("status {}: {}", status, body.trim());
    match status {
        408 | 425 | 429 | 500..=599 => GenerationError::Transient(message),
        _ => GenerationError::Fatal(message),
    }
}

pub(crate) fn classify_transport(error: reqwest::Error) -> GenerationError {
    match error.status() {
        Some(status) => classify_status(status.as_u16(), &error.to_string()),
        // Connection refused, DNS, timeouts: the service may come back.
        None => GenerationError::Transient(error.to_string()),
    }
}
