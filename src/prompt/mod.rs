//! Prompt formatting: chat exchanges flattened into a single Llama 3 style text blob.

use crate::schema::FieldSet;
use crate::types::{ChatMessage, Role, END_OF_TURN};

pub const BEGIN_OF_TEXT: &str = "<|begin_of_text|>";

/// System instruction prepended to bare prompts by the inference client.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an expert at extracting structured data from documents. \
Extract the requested information accurately and return it as valid JSON.";

fn header(role: Role) -> String {
    format!("<|start_header_id|>{role}<|end_header_id|>\n\n")
}

/// Flatten `messages` into one prompt ending with an open assistant turn,
/// so the response begins immediately after the assistant marker.
pub fn format_chat(messages: &[ChatMessage]) -> String {
    let mut out = String::from(BEGIN_OF_TEXT);
    for message in messages {
        out.push_str(&header(message.role));
        out.push_str(&message.content);
        out.push_str(END_OF_TURN);
    }
    out.push_str(&header(Role::Assistant));
    out
}

/// Wrap a bare user prompt with a system instruction.
pub fn format_prompt(system: &str, user: &str) -> String {
    format_chat(&[ChatMessage::system(system), ChatMessage::user(user)])
}

/// User prompt asking the model to fill a [`FieldSet`] from one document.
pub struct ExtractionPrompt<'a> {
    pub fields: &'a FieldSet,
    pub document: &'a str,
}

impl<'a> ExtractionPrompt<'a> {
    pub fn new(fields: &'a FieldSet, document: &'a str) -> Self {
        Self { fields, document }
    }

    pub fn render(&self) -> String {
        let schema = serde_json::to_string_pretty(&self.fields.json_schema()).unwrap_or_default();
        format!(
            "Extract the following information from the document text and return it as valid JSON.

FIELD DEFINITIONS:
{fields}

DOCUMENT TEXT:
{document}

INSTRUCTIONS:
1. If a field is not found or not applicable, set it to null
2. For array fields, return JSON arrays
3. For date fields, use ISO format (YYYY-MM-DD) when possible
4. Field names must match exactly as specified above
5. Return ONLY the JSON object, no additional text

EXPECTED JSON STRUCTURE:
{schema}

JSON Response:",
            fields = self.fields.describe(),
            document = self.document.trim(),
        )
    }
}
