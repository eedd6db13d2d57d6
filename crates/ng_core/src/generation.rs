use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GenerationError;
use crate::types::FieldKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Provider-specific model name. `None` lets the client pick its default.
    pub model: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// The record field this call produces. Clients may use it for logging.
    pub field: Option<FieldKind>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: None,
            temperature: 0.2,
            max_tokens: 512,
            field: None,
        }
    }
}

impl GenerationOptions {
    pub fn for_field(&self, field: FieldKind) -> Self {
        Self {
            field: Some(field),
            ..self.clone()
        }
    }
}

/// A remote text-generation capability. The pipeline only ever talks to
/// the model through this trait.
#[async_trait]
pub trait GenerationClient: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Send one prompt and return the raw completion text.
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> std::result::Result<String, GenerationError>;
}
