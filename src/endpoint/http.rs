//! Endpoint reached over HTTP with a SageMaker-runtime style path layout.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::DocextError;
use crate::http::{build_client, json_headers, status_to_error};
use crate::types::{AsyncHandle, ResultLocation};

use super::{InferenceEndpoint, RequestEnvelope};

/// Response header carrying the output location of an async submission.
pub const OUTPUT_LOCATION_HEADER: &str = "x-amzn-sagemaker-outputlocation";

pub struct HttpEndpoint {
    name: String,
    base_url: String,
    api_token: Option<String>,
    client: reqwest::Client,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AsyncAck {
    output_location: Option<String>,
    inference_id: Option<String>,
}

impl HttpEndpoint {
    pub fn new(
        name: String,
        base_url: String,
        api_token: Option<String>,
        request_timeout: Duration,
    ) -> Result<Self, DocextError> {
        Ok(Self {
            name,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
            client: build_client(request_timeout)?,
        })
    }

    fn url(&self, action: &str) -> String {
        format!("{}/endpoints/{}/{}", self.base_url, self.name, action)
    }

    async fn post(&self, action: &str, envelope: &RequestEnvelope) -> Result<reqwest::Response, DocextError> {
        let resp = self
            .client
            .post(self.url(action))
            .headers(json_headers(self.api_token.as_deref()))
            .json(envelope)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status.as_u16(), &body_text));
        }
        Ok(resp)
    }
}

#[async_trait]
impl InferenceEndpoint for HttpEndpoint {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, envelope: &RequestEnvelope) -> Result<Vec<u8>, DocextError> {
        debug!(endpoint = %self.name, "Invoking endpoint");
        let resp = self.post("invocations", envelope).await?;
        Ok(resp.bytes().await?.to_vec())
    }

    async fn invoke_async(&self, envelope: &RequestEnvelope) -> Result<AsyncHandle, DocextError> {
        debug!(endpoint = %self.name, "Submitting async invocation");
        let resp = self.post("async-invocations", envelope).await?;

        let header_location = resp
            .headers()
            .get(OUTPUT_LOCATION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp.bytes().await?;
        let ack = serde_json::from_slice::<AsyncAck>(&body).ok();

        let (body_location, inference_id) = match ack {
            Some(ack) => (ack.output_location, ack.inference_id),
            None => (None, None),
        };
        let raw = body_location.or(header_location).ok_or_else(|| {
            DocextError::MalformedEnvelope("async acknowledgment without an output location".into())
        })?;

        let location = raw.parse::<ResultLocation>().map_err(|_| {
            DocextError::MalformedEnvelope(format!("invalid output location '{raw}'"))
        })?;
        Ok(AsyncHandle {
            location,
            inference_id,
        })
    }
}
