//! docext: structured field extraction through hosted text-generation endpoints.
//!
//! A prompt goes to an [`InferenceClient`](client::InferenceClient), either
//! directly or by asynchronous submission whose result is polled from a blob
//! store. The generated text is then handed to the response parser, which
//! recovers the embedded JSON object.
//!
//! # Quick Start
//!
//! ```no_run
//! use docext::prelude::*;
//!
//! # async fn example() -> docext::error::Result<()> {
//! let config = DocextConfig::load(None)?;
//! let client = InferenceClient::from_config(&config)?;
//!
//! let text = client
//!     .infer_prompt("Extract the invoice number from: INVOICE #12345", true)
//!     .await?
//!     .into_text()?;
//!
//! match extract_json(&text) {
//!     ExtractedValue::Value(value) => println!("{value}"),
//!     ExtractedValue::ParseFailure(failure) => eprintln!("raw output: {}", failure.raw),
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod extract;
pub mod http;
pub mod parse;
pub mod prelude;
pub mod prompt;
pub mod schema;
pub mod store;
pub mod types;

#[cfg(feature = "cli")]
pub mod cli;
