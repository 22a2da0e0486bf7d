//! Convenience re-exports for common use.

pub use crate::client::{InferenceClient, PollSettings};
pub use crate::config::DocextConfig;
pub use crate::endpoint::InferenceEndpoint;
pub use crate::error::{DocextError, ErrorKind, Result};
pub use crate::extract::{Extraction, Extractor};
pub use crate::parse::{extract_json, extract_typed, ExtractedValue, ParseFailure};
pub use crate::schema::{FieldDefinition, FieldSet, FieldType, ValidationReport};
pub use crate::store::ResultStore;
pub use crate::types::{
    AsyncHandle, ChatMessage, FailureReason, GenerationRequest, GenerationResult, ResultLocation,
    Role,
};
