//! Object store reached with path-style HTTP GETs: `{base_url}/{container}/{key}`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

use crate::error::DocextError;
use crate::http::{build_client, json_headers};
use crate::types::ResultLocation;

use super::ResultStore;

pub struct HttpObjectStore {
    base_url: String,
    api_token: Option<String>,
    client: reqwest::Client,
}

impl HttpObjectStore {
    pub fn new(
        base_url: String,
        api_token: Option<String>,
        request_timeout: Duration,
    ) -> Result<Self, DocextError> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
            client: build_client(request_timeout)?,
        })
    }

    fn object_url(&self, location: &ResultLocation) -> String {
        format!("{}/{}/{}", self.base_url, location.container, location.key)
    }
}

#[async_trait]
impl ResultStore for HttpObjectStore {
    async fn fetch(&self, location: &ResultLocation) -> Result<Option<Vec<u8>>, DocextError> {
        let url = self.object_url(location);
        debug!(%location, url = %url, "Fetching result object");

        let resp = self
            .client
            .get(&url)
            .headers(json_headers(self.api_token.as_deref()))
            .send()
            .await?;

        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(resp.bytes().await?.to_vec())),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                let body = resp.text().await.unwrap_or_default();
                Err(DocextError::Authentication(body))
            }
            status => {
                let body = resp.text().await.unwrap_or_default();
                Err(DocextError::storage(
                    location,
                    format!("status {}: {body}", status.as_u16()),
                ))
            }
        }
    }
}
