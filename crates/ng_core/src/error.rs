use std::fmt;

use thiserror::Error;

use crate::types::FieldKind;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationFailure),

    #[error("Incomplete generation: no accepted {0} field")]
    IncompleteGeneration(FieldKind),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

/// Failure reported by a [`GenerationClient`](crate::GenerationClient) call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// Timeouts, rate limits, dropped connections. Worth another attempt.
    #[error("transient generation failure: {0}")]
    Transient(String),

    /// Authentication or quota problems. Retrying will not help.
    #[error("fatal generation failure: {0}")]
    Fatal(String),
}

impl GenerationError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, GenerationError::Transient(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationReason {
    Empty,
    TooLong { len: usize, max: usize },
    MultiLine,
    NotInVocabulary(String),
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationReason::Empty => write!(f, "output is empty"),
            ValidationReason::TooLong { len, max } => {
                write!(f, "output is {} characters, limit is {}", len, max)
            }
            ValidationReason::MultiLine => write!(f, "output spans multiple lines"),
            ValidationReason::NotInVocabulary(value) => {
                write!(f, "{:?} is not one of the allowed categories", value)
            }
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} rejected: {reason}")]
pub struct ValidationFailure {
    pub kind: FieldKind,
    pub reason: ValidationReason,
}

impl ValidationFailure {
    pub fn new(kind: FieldKind, reason: ValidationReason) -> Self {
        Self { kind, reason }
    }
}

/// The last thing that went wrong for a field before it gave up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LastFailure {
    Generation(GenerationError),
    Validation(ValidationFailure),
}

impl fmt::Display for LastFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LastFailure::Generation(e) => write!(f, "{}", e),
            LastFailure::Validation(e) => write!(f, "{}", e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFailure {
    pub kind: FieldKind,
    pub attempts: u32,
    pub last_failure: LastFailure,
}

impl FieldFailure {
    pub fn is_fatal(&self) -> bool {
        matches!(self.last_failure, LastFailure::Generation(GenerationError::Fatal(_)))
    }
}

impl fmt::Display for FieldFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} exhausted after {} attempt(s): {}",
            self.kind, self.attempts, self.last_failure
        )
    }
}

/// No record was produced for the article. Safe to re-queue the whole article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineError {
    pub failures: Vec<FieldFailure>,
}

impl PipelineError {
    pub fn new(failures: Vec<FieldFailure>) -> Self {
        Self { failures }
    }

    pub fn failed_kinds(&self) -> Vec<FieldKind> {
        self.failures.iter().map(|f| f.kind).collect()
    }

    /// Whether re-submitting the article later could succeed.
    pub fn is_retryable(&self) -> bool {
        !self.failures.iter().any(FieldFailure::is_fatal)
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.failures.iter().map(|f| f.to_string()).collect();
        write!(f, "no record produced ({})", parts.join("; "))
    }
}

impl std::error::Error for PipelineError {}

pub type Result<T> = std::result::Result<T, Error>;
