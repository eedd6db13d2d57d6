use std::fmt;
use std::sync::Arc;

use futures::stream::{self, FuturesUnordered, StreamExt};
use ng_core::{
    ContentRecord, FieldKind, GenerationClient, GenerationOptions, PipelineError, RawArticle,
    RecordId, RecordStorage, Result,
};
use tracing::{debug, info, warn};

use crate::assembler;
use crate::prompts::build_prompt;
use crate::repair::{generate_field, RetryPolicy};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineConfig {
    pub retry: RetryPolicy,
    pub generation: GenerationOptions,
}

/// Turns raw article bodies into validated content records.
pub struct ArticlePipeline {
    client: Arc<dyn GenerationClient>,
    config: PipelineConfig,
}

impl fmt::Debug for ArticlePipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArticlePipeline")
            .field("client", &self.client.name())
            .field("config", &self.config)
            .finish()
    }
}

impl ArticlePipeline {
    pub fn new(client: Arc<dyn GenerationClient>, config: PipelineConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Generate all four fields concurrently and assemble the record.
    ///
    /// The first field to exhaust its attempts fails the article; calls
    /// still in flight for the other fields are dropped.
    pub async fn process_article(&self, article: &RawArticle) -> Result<ContentRecord> {
        article.ensure_valid()?;
        let id = article.fingerprint();

        let prompts = FieldKind::ALL
            .iter()
            .map(|&kind| build_prompt(kind, &article.body).map(|prompt| (kind, prompt)))
            .collect::<Result<Vec<_>>>()?;
        debug!(id = %id, chars = article.body.chars().count(), "built prompts");

        let mut pending: FuturesUnordered<_> = prompts
            .iter()
            .map(|(kind, prompt)| {
                generate_field(
                    self.client.as_ref(),
                    *kind,
                    prompt,
                    &self.config.generation,
                    &self.config.retry,
                )
            })
            .collect();

        let mut accepted = Vec::with_capacity(prompts.len());
        while let Some(outcome) = pending.next().await {
            match outcome {
                Ok(field) => {
                    debug!(id = %id, field = %field.kind, attempts = field.attempts, "field accepted");
                    accepted.push(field);
                }
                Err(failure) => {
                    warn!(
                        id = %id,
                        abandoned = pending.len(),
                        "article failed: {}",
                        failure
                    );
                    return Err(PipelineError::new(vec![failure]).into());
                }
            }
        }

        let record = assembler::assemble(article, accepted)?;
        info!(id = %record.id, category = %record.category, "assembled record: {}", record.title);
        Ok(record)
    }

    /// Process and hand the record to storage, returning the stored id.
    pub async fn process_and_store(
        &self,
        article: &RawArticle,
        storage: &dyn RecordStorage,
    ) -> Result<RecordId> {
        let record = self.process_article(article).await?;
        storage.save(&record).await
    }

    /// Process several articles with at most `concurrency` in flight.
    /// Results come back in input order.
    pub async fn process_batch(
        &self,
        articles: &[RawArticle],
        concurrency: usize,
    ) -> Vec<Result<ContentRecord>> {
        stream::iter(articles)
            .map(|article| self.process_article(article))
            .buffered(concurrency.max(1))
            .collect()
            .await
    }
}
