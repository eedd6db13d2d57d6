use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use ng_core::{FieldKind, GenerationClient, GenerationError, GenerationOptions};

type Reply = Result<String, GenerationError>;

/// Test double that plays back queued replies per field.
///
/// Each field's queue is consumed front to back; the last reply repeats once
/// the queue is down to one entry. Calls and prompts are recorded so tests can
/// assert on how often and with what the model was asked.
#[derive(Debug, Default)]
pub struct ScriptedClient {
    replies: Mutex<HashMap<FieldKind, VecDeque<Reply>>>,
    latency: HashMap<FieldKind, Duration>,
    prompts: Mutex<HashMap<FieldKind, Vec<String>>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, kind: FieldKind, text: impl Into<String>) -> Self {
        self.push(kind, Ok(text.into()))
    }

    pub fn fail(self, kind: FieldKind, error: GenerationError) -> Self {
        self.push(kind, Err(error))
    }

    pub fn with_latency(mut self, kind: FieldKind, latency: Duration) -> Self {
        self.latency.insert(kind, latency);
        self
    }

    fn push(self, kind: FieldKind, reply: Reply) -> Self {
        self.replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(kind)
            .or_default()
            .push_back(reply);
        self
    }

    pub fn calls(&self, kind: FieldKind) -> usize {
        self.prompts(kind).len()
    }

    pub fn total_calls(&self) -> usize {
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .map(Vec::len)
            .sum()
    }

    pub fn prompts(&self, kind: FieldKind) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&kind)
            .cloned()
            .unwrap_or_default()
    }

    fn next_reply(&self, kind: FieldKind) -> Reply {
        let mut replies = self.replies.lock().unwrap_or_else(|e| e.into_inner());
        let queue = replies.entry(kind).or_default();
        let reply = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        reply.unwrap_or_else(|| Err(GenerationError::Fatal(format!("no scripted reply for {}", kind))))
    }
}

#[async_trait::async_trait]
impl GenerationClient for ScriptedClient {
    fn name(&self) -> &str {
        "Scripted"
    }

    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Reply {
        let kind = options
            .field
            .ok_or_else(|| GenerationError::Fatal("scripted client needs a field".to_string()))?;

        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(kind)
            .or_default()
            .push(prompt.to_string());

        if let Some(latency) = self.latency.get(&kind) {
            tokio::time::sleep(*latency).await;
        }

        self.next_reply(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replays_queue_then_repeats_last() {
        let client = ScriptedClient::new()
            .respond(FieldKind::Title, "first")
            .respond(FieldKind::Title, "second");
        let options = GenerationOptions::default().for_field(FieldKind::Title);

        assert_eq!(client.generate("p", &options).await.unwrap(), "first");
        assert_eq!(client.generate("p", &options).await.unwrap(), "second");
        assert_eq!(client.generate("p", &options).await.unwrap(), "second");
        assert_eq!(client.calls(FieldKind::Title), 3);
        assert_eq!(client.total_calls(), 3);
    }

    #[tokio::test]
    async fn test_unscripted_field_is_fatal() {
        let client = ScriptedClient::new();
        let options = GenerationOptions::default().for_field(FieldKind::Summary);
        assert!(matches!(
            client.generate("p", &options).await,
            Err(GenerationError::Fatal(_))
        ));
        assert!(client.generate("p", &GenerationOptions::default()).await.is_err());
    }
}
