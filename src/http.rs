//! Shared HTTP client construction, auth headers and status mapping.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};

use crate::error::DocextError;

/// Build the reqwest client used by one endpoint or store.
pub fn build_client(request_timeout: Duration) -> Result<reqwest::Client, DocextError> {
    Ok(reqwest::Client::builder()
        .timeout(request_timeout)
        .pool_max_idle_per_host(10)
        .build()?)
}

/// JSON headers, plus a bearer token when an ambient credential is configured.
pub fn json_headers(api_token: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    if let Some(token) = api_token {
        if let Ok(val) = HeaderValue::from_str(&format!("Bearer {token}")) {
            headers.insert(AUTHORIZATION, val);
        }
    }
    headers
}

/// Map a non-success HTTP status to a typed error.
pub fn status_to_error(status: u16, body: &str) -> DocextError {
    match status {
        401 | 403 => DocextError::Authentication(body.to_string()),
        _ => DocextError::api(status, body),
    }
}
