//! Recover a JSON object from free-form model output.
//!
//! Model output is prose-wrapped JSON at best. The recovery is deliberately
//! simple: strip code fences and triple quotes, then take everything between
//! the first `{` and the last `}`. This is exact for a single embedded object
//! and can mis-capture when unrelated braces surround it.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

/// Result of recovering JSON from model text. Never an error: failures carry the raw text.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractedValue {
    Value(Value),
    ParseFailure(ParseFailure),
}

/// Model text that did not contain parseable JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    /// The input exactly as received.
    pub raw: String,
    pub reason: String,
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no parseable JSON in model output: {}", self.reason)
    }
}

impl std::error::Error for ParseFailure {}

impl ExtractedValue {
    pub fn is_value(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::ParseFailure(_) => None,
        }
    }

    pub fn into_result(self) -> Result<Value, ParseFailure> {
        match self {
            Self::Value(value) => Ok(value),
            Self::ParseFailure(failure) => Err(failure),
        }
    }
}

fn leading_fence() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^[ \t]*```(?i:json)?\s*").expect("valid fence regex"))
}

fn trailing_fence() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)\s*```[ \t]*$").expect("valid fence regex"))
}

/// Remove code-fence markers and surrounding triple quotes.
fn strip_wrapping(text: &str) -> String {
    let without_open = leading_fence().replace_all(text, "");
    let without_fences = trailing_fence().replace_all(&without_open, "");
    without_fences
        .trim()
        .trim_start_matches("\"\"\"")
        .trim_end_matches("\"\"\"")
        .trim_start_matches("'''")
        .trim_end_matches("'''")
        .trim()
        .to_string()
}

/// Slice from the first `{` to the last `}` inclusive, if they are in order.
fn object_candidate(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// Recover the JSON object embedded in `text`.
///
/// Pure and total: the input is never modified and malformed input yields
/// [`ExtractedValue::ParseFailure`] holding the original text verbatim.
///
/// ```
/// use docext::parse::extract_json;
///
/// let value = extract_json("Sure! Here is the result: {\"a\":1} Hope that helps.");
/// assert_eq!(value.as_value().unwrap()["a"], 1);
/// ```
pub fn extract_json(text: &str) -> ExtractedValue {
    let cleaned = strip_wrapping(text);
    let candidate = object_candidate(&cleaned).unwrap_or(&cleaned);

    match serde_json::from_str::<Value>(candidate) {
        Ok(value) => ExtractedValue::Value(value),
        Err(e) => {
            warn!(error = %e, "Model output did not contain parseable JSON");
            debug!(raw = text, "Unparseable model output");
            ExtractedValue::ParseFailure(ParseFailure {
                raw: text.to_string(),
                reason: e.to_string(),
            })
        }
    }
}

/// Recover and deserialize into `T`; a shape mismatch is reported like a parse failure.
pub fn extract_typed<T: DeserializeOwned>(text: &str) -> Result<T, ParseFailure> {
    let value = extract_json(text).into_result()?;
    serde_json::from_value(value).map_err(|e| ParseFailure {
        raw: text.to_string(),
        reason: e.to_string(),
    })
}
