//! Wire envelopes exchanged with a text-generation endpoint.

use serde::{Deserialize, Serialize};

use crate::error::DocextError;
use crate::types::GenerationRequest;

/// Outbound request body: `{"inputs": ..., "parameters": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    pub inputs: String,
    pub parameters: Parameters,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    pub max_new_tokens: u32,
    pub temperature: f64,
    pub top_p: f64,
    pub do_sample: bool,
    pub stop: Vec<String>,
    pub return_full_text: bool,
}

impl RequestEnvelope {
    /// Envelope for an already formatted prompt.
    pub fn new(inputs: impl Into<String>, request: &GenerationRequest) -> Self {
        Self {
            inputs: inputs.into(),
            parameters: Parameters {
                max_new_tokens: request.max_tokens,
                temperature: request.temperature,
                top_p: request.top_p,
                do_sample: request.do_sample,
                stop: request.stop_sequences.clone(),
                return_full_text: request.return_full_text,
            },
        }
    }
}

#[derive(Deserialize)]
struct Generated {
    generated_text: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ResponseEnvelope {
    Batch(Vec<Generated>),
    Single(Generated),
}

const SNIPPET_LEN: usize = 200;

fn snippet(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    match text.char_indices().nth(SNIPPET_LEN) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.into_owned(),
    }
}

/// Pull `generated_text` out of `[{"generated_text": ..}]` or `{"generated_text": ..}`.
pub fn decode_generated_text(body: &[u8]) -> Result<String, DocextError> {
    let envelope: ResponseEnvelope = serde_json::from_slice(body)
        .map_err(|_| DocextError::MalformedEnvelope(snippet(body)))?;
    match envelope {
        ResponseEnvelope::Single(generated) => Ok(generated.generated_text),
        ResponseEnvelope::Batch(items) => items
            .into_iter()
            .next()
            .map(|generated| generated.generated_text)
            .ok_or_else(|| DocextError::MalformedEnvelope("empty response array".into())),
    }
}

/// Drop the formatted prompt when the endpoint echoes it back despite
/// `return_full_text: false`. Only a leading echo is removed.
pub fn strip_prompt_echo(text: String, prompt: &str) -> String {
    if prompt.is_empty() {
        return text;
    }
    if let Some(rest) = text.strip_prefix(prompt) {
        return rest.trim_start().to_string();
    }
    text
}
