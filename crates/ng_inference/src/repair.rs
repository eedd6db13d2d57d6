//! Per-field retry loop: generate, validate, and try again until the output
//! is accepted or the attempt budget runs out.

use std::borrow::Cow;
use std::time::Duration;

use ng_core::{
    FieldFailure, FieldKind, GeneratedField, GenerationClient, GenerationError, GenerationOptions,
    LastFailure,
};
use tracing::{debug, error, warn};

use crate::prompts::strict_reminder;
use crate::validator;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Generation calls allowed per field, first attempt included.
    pub max_attempts: u32,
    /// Deadline for a single generation call. Expiry counts as a transient failure.
    pub call_timeout: Duration,
    /// Base delay before retrying a transient failure, doubled on each repeat.
    /// Validation failures retry immediately.
    pub backoff: Duration,
    /// Append a reminder of the violated contract to the prompt on retries.
    pub strict_reminder: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            call_timeout: Duration::from_secs(60),
            backoff: Duration::from_millis(500),
            strict_reminder: true,
        }
    }
}

impl RetryPolicy {
    fn attempt_budget(&self) -> u32 {
        self.max_attempts.max(1)
    }

    fn backoff_for(&self, transient_failures: u32) -> Duration {
        let exponent = transient_failures.saturating_sub(1).min(16);
        self.backoff.saturating_mul(1 << exponent)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldState {
    Pending,
    Generating,
    Validating,
    Retrying,
    Accepted,
    Exhausted,
}

struct FieldRun {
    kind: FieldKind,
    state: FieldState,
    attempts: u32,
}

impl FieldRun {
    fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            state: FieldState::Pending,
            attempts: 0,
        }
    }

    fn enter(&mut self, next: FieldState) {
        debug!(field = %self.kind, attempt = self.attempts, from = ?self.state, to = ?next, "field state");
        self.state = next;
    }

    fn exhaust(mut self, last_failure: LastFailure) -> FieldFailure {
        self.enter(FieldState::Exhausted);
        FieldFailure {
            kind: self.kind,
            attempts: self.attempts,
            last_failure,
        }
    }
}

/// Drive one field to `Accepted` or `Exhausted`.
///
/// `prompt` is the template output for `kind`. A fatal generation error
/// stops immediately; transient and validation failures are retried until
/// `policy.max_attempts` calls have been made.
pub async fn generate_field(
    client: &dyn GenerationClient,
    kind: FieldKind,
    prompt: &str,
    options: &GenerationOptions,
    policy: &RetryPolicy,
) -> Result<GeneratedField, FieldFailure> {
    let options = options.for_field(kind);
    let budget = policy.attempt_budget();
    let mut run = FieldRun::new(kind);
    let mut current_prompt = Cow::Borrowed(prompt);
    let mut transient_failures = 0;

    loop {
        run.attempts += 1;
        run.enter(FieldState::Generating);

        let outcome = match tokio::time::timeout(
            policy.call_timeout,
            client.generate(&current_prompt, &options),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(_) => Err(GenerationError::Transient(format!(
                "no response within {}ms",
                policy.call_timeout.as_millis()
            ))),
        };

        let failure = match outcome {
            Ok(raw) => {
                run.enter(FieldState::Validating);
                match validator::validate(kind, &raw) {
                    Ok(value) => {
                        run.enter(FieldState::Accepted);
                        return Ok(GeneratedField {
                            kind,
                            raw,
                            value,
                            attempts: run.attempts,
                        });
                    }
                    Err(rejection) => {
                        debug!(field = %kind, raw = %raw, "rejected output");
                        LastFailure::Validation(rejection)
                    }
                }
            }
            Err(GenerationError::Fatal(message)) => {
                error!(field = %kind, attempt = run.attempts, "generation failed fatally: {}", message);
                return Err(run.exhaust(LastFailure::Generation(GenerationError::Fatal(message))));
            }
            Err(transient) => {
                transient_failures += 1;
                LastFailure::Generation(transient)
            }
        };

        warn!(
            field = %kind,
            attempt = run.attempts,
            max_attempts = budget,
            "attempt failed: {}",
            failure
        );

        if run.attempts >= budget {
            return Err(run.exhaust(failure));
        }
        run.enter(FieldState::Retrying);

        if policy.strict_reminder {
            current_prompt = Cow::Owned(format!("{}{}", prompt, strict_reminder(kind, &failure)));
        }

        if matches!(failure, LastFailure::Generation(_)) {
            let delay = policy.backoff_for(transient_failures);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }
}
