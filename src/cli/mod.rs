//! CLI entry point for docext.

pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// docext CLI
#[derive(Parser, Debug)]
#[command(
    name = "docext",
    version,
    about = "Structured extraction through hosted text-generation endpoints"
)]
pub struct Cli {
    /// Config file (defaults to $DOCEXT_CONFIG, then the user config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one prompt and print the generated text
    Infer(InferArgs),
    /// Extract fields from plain-text documents
    Extract(ExtractArgs),
    /// Recover JSON from model output in a file or stdin
    Parse(ParseArgs),
}

/// Arguments for `docext infer`.
#[derive(Parser, Debug)]
pub struct InferArgs {
    /// Call the synchronous endpoint instead of submitting asynchronously
    #[arg(long)]
    pub sync: bool,

    /// Max new tokens
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Temperature (0.0 - 1.0)
    #[arg(short, long)]
    pub temperature: Option<f64>,

    /// Prompt text
    pub prompt: String,
}

/// Arguments for `docext extract`.
#[derive(Parser, Debug)]
pub struct ExtractArgs {
    /// Field definitions (.toml or .json)
    #[arg(short, long)]
    pub fields: PathBuf,

    /// Call the synchronous endpoint instead of submitting asynchronously
    #[arg(long)]
    pub sync: bool,

    /// Write results here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Plain-text documents
    #[arg(required = true)]
    pub documents: Vec<PathBuf>,
}

/// Arguments for `docext parse`.
#[derive(Parser, Debug)]
pub struct ParseArgs {
    /// File with model output; reads stdin when omitted
    pub file: Option<PathBuf>,
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
