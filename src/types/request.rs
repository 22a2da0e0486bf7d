//! Generation request and per-client generation defaults.

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::error::DocextError;

/// End-of-turn marker of the Llama 3 chat template; the default stop sequence.
pub const END_OF_TURN: &str = "<|eot_id|>";

pub const DEFAULT_MAX_TOKENS: u32 = 2048;
pub const DEFAULT_TEMPERATURE: f64 = 0.1;
pub const DEFAULT_TOP_P: f64 = 0.9;

/// A single text-generation request. Built once per call and never mutated.
///
/// ```
/// use docext::types::GenerationRequest;
///
/// let request = GenerationRequest::builder()
///     .prompt("Extract the invoice number")
///     .max_tokens(512)
///     .build();
/// assert_eq!(request.temperature, 0.1);
/// ```
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
pub struct GenerationRequest {
    #[builder(into)]
    pub prompt: String,
    #[builder(default = DEFAULT_MAX_TOKENS)]
    pub max_tokens: u32,
    #[builder(default = DEFAULT_TEMPERATURE)]
    pub temperature: f64,
    #[builder(default = DEFAULT_TOP_P)]
    pub top_p: f64,
    #[builder(default = vec![END_OF_TURN.to_string()])]
    pub stop_sequences: Vec<String>,
    #[builder(default = true)]
    pub do_sample: bool,
    #[builder(default = false)]
    pub return_full_text: bool,
}

impl GenerationRequest {
    /// Reject parameters the endpoint would refuse or silently clamp.
    pub fn validate(&self) -> Result<(), DocextError> {
        if self.max_tokens == 0 {
            return Err(DocextError::InvalidArgument(
                "max_tokens must be greater than zero".into(),
            ));
        }
        check_unit_interval("temperature", self.temperature)?;
        check_unit_interval("top_p", self.top_p)?;
        Ok(())
    }
}

pub(crate) fn check_unit_interval(name: &str, value: f64) -> Result<(), DocextError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(DocextError::InvalidArgument(format!(
            "{name} must be within [0, 1], got {value}"
        )));
    }
    Ok(())
}

/// Default generation parameters held by a client and applied to bare prompts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationDefaults {
    pub max_tokens: u32,
    pub temperature: f64,
    pub top_p: f64,
    pub stop_sequences: Vec<String>,
    pub do_sample: bool,
    pub return_full_text: bool,
}

impl Default for GenerationDefaults {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
            stop_sequences: vec![END_OF_TURN.to_string()],
            do_sample: true,
            return_full_text: false,
        }
    }
}

impl GenerationDefaults {
    /// Build a request for `prompt` carrying these defaults.
    pub fn request(&self, prompt: impl Into<String>) -> GenerationRequest {
        GenerationRequest {
            prompt: prompt.into(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            top_p: self.top_p,
            stop_sequences: self.stop_sequences.clone(),
            do_sample: self.do_sample,
            return_full_text: self.return_full_text,
        }
    }
}
