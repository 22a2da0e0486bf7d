//! Handlers behind each CLI subcommand.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use serde_json::{json, Value};
use tokio::io::AsyncReadExt;
use tracing::info;

use super::{ExtractArgs, InferArgs, ParseArgs};
use crate::client::InferenceClient;
use crate::config::DocextConfig;
use crate::error::DocextError;
use crate::extract::{Extraction, Extractor};
use crate::parse::{extract_json, ExtractedValue};
use crate::schema::FieldSet;

/// `docext infer`: print the generated text.
pub async fn handle_infer(config: &DocextConfig, args: InferArgs) -> Result<ExitCode, DocextError> {
    let client = InferenceClient::from_config(config)?;

    let mut request = client.request(args.prompt);
    if let Some(max_tokens) = args.max_tokens {
        request.max_tokens = max_tokens;
    }
    if let Some(temperature) = args.temperature {
        request.temperature = temperature;
    }

    let text = client.infer(&request, !args.sync).await?.into_text()?;
    println!("{text}");
    Ok(ExitCode::SUCCESS)
}

/// `docext extract`: run every document through the extractor and emit one JSON report.
pub async fn handle_extract(
    config: &DocextConfig,
    args: ExtractArgs,
) -> Result<ExitCode, DocextError> {
    let fields = FieldSet::load(&args.fields)?;
    let extractor = Extractor::new(InferenceClient::from_config(config)?, fields)
        .prefer_async(!args.sync);

    let mut documents = Vec::with_capacity(args.documents.len());
    for path in &args.documents {
        documents.push(tokio::fs::read_to_string(path).await?);
    }

    let results = extractor.extract_batch(&documents).await;
    let report = extraction_report(&args.documents, &results)?;
    let rendered = serde_json::to_string_pretty(&report)?;

    match &args.output {
        Some(path) => {
            tokio::fs::write(path, rendered).await?;
            info!(path = %path.display(), documents = results.len(), "Wrote extraction results");
        }
        None => println!("{rendered}"),
    }

    let all_ok = results
        .iter()
        .all(|r| r.as_ref().is_ok_and(|e| e.value.is_value()));
    Ok(if all_ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// One entry per document: the extraction summary or the error that stopped it.
pub fn extraction_report(
    paths: &[PathBuf],
    results: &[Result<Extraction, DocextError>],
) -> Result<Value, DocextError> {
    let mut entries = Vec::with_capacity(results.len());
    for (path, result) in paths.iter().zip(results) {
        let document = path.display().to_string();
        let entry = match result {
            Ok(extraction) => json!({
                "document": document,
                "result": serde_json::to_value(extraction.to_summary())?,
            }),
            Err(e) => json!({ "document": document, "error": e.to_string() }),
        };
        entries.push(entry);
    }
    Ok(Value::Array(entries))
}

/// `docext parse`: print recovered JSON, or the raw text with a failure exit code.
pub async fn handle_parse(args: ParseArgs) -> Result<ExitCode, DocextError> {
    let text = read_input(args.file.as_deref()).await?;
    match extract_json(&text) {
        ExtractedValue::Value(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(ExitCode::SUCCESS)
        }
        ExtractedValue::ParseFailure(failure) => {
            eprintln!("Error: {failure}");
            print!("{}", failure.raw);
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn read_input(path: Option<&Path>) -> Result<String, DocextError> {
    match path {
        Some(path) => Ok(tokio::fs::read_to_string(path).await?),
        None => {
            let mut text = String::new();
            tokio::io::stdin().read_to_string(&mut text).await?;
            Ok(text)
        }
    }
}
