//! Text-generation endpoint trait and backends.

pub mod envelope;
pub mod http;

use async_trait::async_trait;

use crate::config::DocextConfig;
use crate::error::DocextError;
use crate::types::AsyncHandle;

pub use envelope::{decode_generated_text, strip_prompt_echo, Parameters, RequestEnvelope};
pub use http::HttpEndpoint;

/// A hosted model endpoint reachable directly or through asynchronous submission.
#[async_trait]
pub trait InferenceEndpoint: Send + Sync {
    /// Endpoint identity, used in logs.
    fn name(&self) -> &str;

    /// Send the envelope and return the raw response body.
    async fn invoke(&self, envelope: &RequestEnvelope) -> Result<Vec<u8>, DocextError>;

    /// Submit the envelope for asynchronous processing and return where the
    /// result will eventually be written.
    async fn invoke_async(&self, envelope: &RequestEnvelope) -> Result<AsyncHandle, DocextError>;
}

/// Create the endpoint backend described by `config`.
pub fn create_endpoint(config: &DocextConfig) -> Result<Box<dyn InferenceEndpoint>, DocextError> {
    let endpoint = &config.endpoint;
    Ok(Box::new(HttpEndpoint::new(
        endpoint.name.clone(),
        endpoint.base_url.clone(),
        endpoint.api_token.clone(),
        config.http.request_timeout(),
    )?))
}
