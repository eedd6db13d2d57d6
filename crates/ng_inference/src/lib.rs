use std::fmt;

pub mod assembler;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod repair;
pub mod validator;

pub use models::create_client;
pub use pipeline::{ArticlePipeline, PipelineConfig};
pub use repair::{FieldState, RetryPolicy};

#[derive(Clone)]
pub struct Config {
    /// One of [`models::AVAILABLE_MODELS`].
    pub model: String,
    pub model_url: Option<String>,
    pub api_key: Option<String>,
    pub pipeline: PipelineConfig,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("model", &self.model)
            .field("model_url", &self.model_url)
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("pipeline", &self.pipeline)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: "dummy".to_string(),
            model_url: None,
            api_key: None,
            pipeline: PipelineConfig::default(),
        }
    }
}

impl Config {
    /// Build the client named by `model` and wrap it in a pipeline.
    pub fn build_pipeline(&self) -> ng_core::Result<ArticlePipeline> {
        let client = create_client(self)?;
        Ok(ArticlePipeline::new(client, self.pipeline.clone()))
    }
}

pub mod prelude {
    pub use super::models::create_client;
    pub use super::{ArticlePipeline, Config, PipelineConfig, RetryPolicy};
    pub use ng_core::{Category, ContentRecord, Error, FieldKind, RawArticle, RecordId, Result};
}
