//! Document extraction: render a field prompt, run inference, recover and validate JSON.

use serde::Serialize;
use tracing::{info, warn};

use crate::client::InferenceClient;
use crate::error::DocextError;
use crate::parse::{extract_json, ExtractedValue};
use crate::prompt::ExtractionPrompt;
use crate::schema::{FieldSet, ValidationReport};

/// Outcome of extracting one document.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Model output as received, kept for inspection of parse failures.
    pub raw_text: String,
    pub value: ExtractedValue,
    /// Present when the output parsed; validation problems never fail an extraction.
    pub report: Option<ValidationReport>,
}

impl Extraction {
    pub fn is_valid(&self) -> bool {
        self.report.as_ref().is_some_and(ValidationReport::is_valid)
    }

    /// JSON summary suitable for writing out batch results.
    pub fn to_summary(&self) -> ExtractionSummary<'_> {
        match &self.value {
            ExtractedValue::Value(value) => ExtractionSummary {
                data: Some(value),
                errors: self
                    .report
                    .as_ref()
                    .map(|r| r.errors.as_slice())
                    .unwrap_or_default(),
                raw_text: None,
            },
            ExtractedValue::ParseFailure(failure) => ExtractionSummary {
                data: None,
                errors: &[],
                raw_text: Some(&failure.raw),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ExtractionSummary<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<&'a serde_json::Value>,
    pub errors: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<&'a str>,
}

/// Extracts a fixed [`FieldSet`] from documents through one inference client.
pub struct Extractor {
    client: InferenceClient,
    fields: FieldSet,
    prefer_async: bool,
}

impl Extractor {
    pub fn new(client: InferenceClient, fields: FieldSet) -> Self {
        Self {
            client,
            fields,
            prefer_async: true,
        }
    }

    pub fn prefer_async(mut self, prefer_async: bool) -> Self {
        self.prefer_async = prefer_async;
        self
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    pub fn client(&self) -> &InferenceClient {
        &self.client
    }

    /// Extract the configured fields from one plain-text document.
    ///
    /// Service errors and timeouts are returned as errors; unparseable output
    /// is returned as an [`Extraction`] holding a parse failure.
    pub async fn extract(&self, document: &str) -> Result<Extraction, DocextError> {
        let prompt = ExtractionPrompt::new(&self.fields, document).render();
        let request = self.client.request(prompt);

        info!(fields = self.fields.len(), "Sending document for extraction");
        let raw_text = self
            .client
            .infer(&request, self.prefer_async)
            .await?
            .into_text()?;

        let value = extract_json(&raw_text);
        let report = value.as_value().map(|v| self.fields.validate(v));
        match &report {
            Some(report) if !report.is_valid() => {
                warn!(errors = ?report.errors, "Extracted data failed validation");
            }
            Some(_) => info!("Extracted data passed validation"),
            None => warn!("Failed to parse model response"),
        }

        Ok(Extraction {
            raw_text,
            value,
            report,
        })
    }

    /// Extract documents sequentially, pausing the client's batch delay between them.
    pub async fn extract_batch(&self, documents: &[String]) -> Vec<Result<Extraction, DocextError>> {
        let delay = self.client.batch_delay();
        let total = documents.len();
        let mut results = Vec::with_capacity(total);
        for (index, document) in documents.iter().enumerate() {
            info!(index = index + 1, total, "Extracting document");
            results.push(self.extract(document).await);
            if index + 1 < total && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
        results
    }
}
