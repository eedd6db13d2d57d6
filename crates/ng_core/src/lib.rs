pub mod error;
pub mod generation;
pub mod storage;
pub mod types;

pub use error::{
    Error, FieldFailure, GenerationError, LastFailure, PipelineError, Result, ValidationFailure,
    ValidationReason,
};
pub use generation::{GenerationClient, GenerationOptions};
pub use storage::RecordStorage;
pub use types::{
    slugify, Category, ContentRecord, FieldKind, GeneratedField, RawArticle, RecordId,
};
