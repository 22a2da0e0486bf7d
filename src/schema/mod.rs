//! Field definitions describing what to extract, and validation of extracted values.
//!
//! A [`FieldSet`] is loaded from a TOML or JSON file:
//!
//! ```toml
//! [[fields]]
//! name = "invoice_number"
//! type = "string"
//! description = "Invoice identifier printed in the header"
//! validation_pattern = "INV-[0-9]+"
//! example = "INV-1042"
//!
//! [[fields]]
//! name = "total_amount"
//! type = "number"
//! description = "Grand total including tax"
//! required = false
//! ```

use std::collections::HashMap;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use strum::{Display, EnumString};
use tracing::debug;

use crate::error::DocextError;

/// Declared type of an extracted field. Unknown names fall back to `String`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    Date,
    Currency,
}

impl From<String> for FieldType {
    fn from(value: String) -> Self {
        value.trim().parse().unwrap_or(FieldType::String)
    }
}

impl From<FieldType> for String {
    fn from(value: FieldType) -> Self {
        value.to_string()
    }
}

impl FieldType {
    fn json_type(self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
            Self::String | Self::Date | Self::Currency => "string",
        }
    }
}

fn default_required() -> bool {
    true
}

/// One field to extract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    #[serde(alias = "field_name")]
    pub name: String,
    #[serde(rename = "type", alias = "field_type", default = "default_field_type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default, alias = "validation_rules", skip_serializing_if = "Option::is_none")]
    pub validation_pattern: Option<String>,
    #[serde(default, alias = "example_value", skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

fn default_field_type() -> FieldType {
    FieldType::String
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, field_type: FieldType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type,
            description: description.into(),
            required: true,
            validation_pattern: None,
            example: None,
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.validation_pattern = Some(pattern.into());
        self
    }

    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.example = Some(example.into());
        self
    }
}

#[derive(Deserialize)]
struct FieldTable {
    fields: Vec<FieldDefinition>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FieldFile {
    Table { fields: Vec<FieldDefinition> },
    List(Vec<FieldDefinition>),
}

impl FieldFile {
    fn into_fields(self) -> Vec<FieldDefinition> {
        match self {
            Self::Table { fields } | Self::List(fields) => fields,
        }
    }
}

/// Ordered set of field definitions with their validation patterns compiled.
#[derive(Debug, Clone, Default)]
pub struct FieldSet {
    fields: Vec<FieldDefinition>,
    patterns: HashMap<String, Regex>,
}

impl FieldSet {
    /// Build a set, skipping blank names and compiling every validation pattern.
    pub fn new(definitions: Vec<FieldDefinition>) -> Result<Self, DocextError> {
        let mut fields = Vec::with_capacity(definitions.len());
        let mut patterns = HashMap::new();
        for mut field in definitions {
            field.name = field.name.trim().to_string();
            if field.name.is_empty() {
                continue;
            }
            if let Some(pattern) = field.validation_pattern.as_deref() {
                // Patterns match from the start of the value, not anywhere in it.
                let regex = Regex::new(&format!("^(?:{pattern})")).map_err(|e| {
                    DocextError::Configuration(format!(
                        "invalid validation pattern for field '{}': {e}",
                        field.name
                    ))
                })?;
                patterns.insert(field.name.clone(), regex);
            }
            fields.push(field);
        }
        debug!(count = fields.len(), "Loaded field definitions");
        Ok(Self { fields, patterns })
    }

    pub fn from_toml_str(source: &str) -> Result<Self, DocextError> {
        let table: FieldTable = toml::from_str(source)
            .map_err(|e| DocextError::Configuration(format!("invalid field file: {e}")))?;
        Self::new(table.fields)
    }

    pub fn from_json_str(source: &str) -> Result<Self, DocextError> {
        let file: FieldFile = serde_json::from_str(source)
            .map_err(|e| DocextError::Configuration(format!("invalid field file: {e}")))?;
        Self::new(file.into_fields())
    }

    /// Load from a `.json` file, or TOML for any other extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DocextError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json_str(&source),
            _ => Self::from_toml_str(&source),
        }
    }

    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn required(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.iter().filter(|f| f.required)
    }

    pub fn optional(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.iter().filter(|f| !f.required)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// JSON schema of the object the model is asked to return.
    pub fn json_schema(&self) -> Value {
        let mut properties = Map::new();
        for field in &self.fields {
            let mut property = Map::new();
            property.insert("type".into(), field.field_type.json_type().into());
            property.insert("description".into(), field.description.clone().into());
            if field.field_type == FieldType::Date {
                property.insert("format".into(), "date".into());
            }
            if let Some(example) = &field.example {
                property.insert("example".into(), example.clone().into());
            }
            if let Some(pattern) = &field.validation_pattern {
                property.insert("pattern".into(), pattern.clone().into());
            }
            properties.insert(field.name.clone(), Value::Object(property));
        }
        let required: Vec<&str> = self.required().map(|f| f.name.as_str()).collect();
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Human-readable field list, grouped by type in order of first appearance.
    pub fn describe(&self) -> String {
        let mut groups: Vec<(FieldType, Vec<&FieldDefinition>)> = Vec::new();
        for field in &self.fields {
            match groups.iter_mut().find(|(ty, _)| *ty == field.field_type) {
                Some((_, members)) => members.push(field),
                None => groups.push((field.field_type, vec![field])),
            }
        }

        let mut lines = Vec::new();
        for (field_type, members) in groups {
            lines.push(format!("\n{} FIELDS:", field_type.to_string().to_uppercase()));
            for field in members {
                let mut line = format!("- {}: {}", field.name, field.description);
                if let Some(example) = &field.example {
                    line.push_str(&format!(" (Example: {example})"));
                }
                if !field.required {
                    line.push_str(" [OPTIONAL]");
                }
                lines.push(line);
            }
        }
        lines.join("\n")
    }

    /// Check an extracted value against the definitions. Never fails; problems are collected.
    pub fn validate(&self, value: &Value) -> ValidationReport {
        let mut errors = Vec::new();
        let Some(object) = value.as_object() else {
            errors.push("Response is not a valid JSON object".to_string());
            return ValidationReport { errors };
        };

        for field in self.required() {
            match object.get(&field.name) {
                None => errors.push(format!("Required field '{}' is missing", field.name)),
                Some(Value::Null) => {
                    errors.push(format!("Required field '{}' is empty", field.name))
                }
                Some(Value::String(s)) if s.is_empty() => {
                    errors.push(format!("Required field '{}' is empty", field.name))
                }
                Some(_) => {}
            }
        }

        for field in &self.fields {
            let Some(value) = object.get(&field.name).filter(|v| !v.is_null()) else {
                continue;
            };
            if let Some(expected) = type_mismatch(field.field_type, value) {
                errors.push(format!("Field '{}' should be {expected}", field.name));
            }
            if let (Some(regex), Value::String(s)) = (self.patterns.get(&field.name), value) {
                if !regex.is_match(s) {
                    errors.push(format!(
                        "Field '{}' does not match validation pattern",
                        field.name
                    ));
                }
            }
        }

        ValidationReport { errors }
    }
}

/// Lenient type check: numeric and boolean fields accept their string spellings.
fn type_mismatch(field_type: FieldType, value: &Value) -> Option<&'static str> {
    let ok = match field_type {
        FieldType::Number => match value {
            Value::Number(_) | Value::Bool(_) => true,
            Value::String(s) => s.trim().parse::<f64>().is_ok(),
            _ => false,
        },
        FieldType::Integer => match value {
            Value::Number(n) => n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0),
            Value::Bool(_) => true,
            Value::String(s) => s.trim().parse::<i64>().is_ok(),
            _ => false,
        },
        FieldType::Boolean => {
            let spelled = match value {
                Value::Bool(_) => return None,
                Value::String(s) => s.to_lowercase(),
                other => other.to_string(),
            };
            matches!(spelled.as_str(), "true" | "false" | "1" | "0")
        }
        FieldType::Array => value.is_array(),
        FieldType::String | FieldType::Object | FieldType::Date | FieldType::Currency => true,
    };
    if ok {
        return None;
    }
    Some(match field_type {
        FieldType::Number => "a number",
        FieldType::Integer => "an integer",
        FieldType::Boolean => "a boolean",
        _ => "an array",
    })
}

/// Outcome of validating one extracted object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}
