//! Read-only access to the blob store where asynchronous results land.

pub mod http;
pub mod local;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::debug;

use crate::config::DocextConfig;
use crate::error::DocextError;
use crate::types::ResultLocation;

pub use http::HttpObjectStore;
pub use local::LocalObjectStore;

/// A store that can be polled for a result object.
///
/// Implementations only read: polling never creates, modifies or deletes objects.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Read the object at `location`. `Ok(None)` means it does not exist yet,
    /// the only condition callers treat as retryable.
    async fn fetch(&self, location: &ResultLocation) -> Result<Option<Vec<u8>>, DocextError>;
}

/// Available store backends, chosen once when a client is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StoreKind {
    #[default]
    Http,
    Local,
}

/// Create the store backend described by `config`.
///
/// Returns `None` when the selected kind has no location configured; such a
/// client can still invoke the endpoint directly but cannot poll.
pub fn create_store(config: &DocextConfig) -> Result<Option<Box<dyn ResultStore>>, DocextError> {
    let store = &config.store;
    let backend: Box<dyn ResultStore> = match (store.kind, &store.base_url, &store.root) {
        (StoreKind::Http, Some(base_url), _) => Box::new(HttpObjectStore::new(
            base_url.clone(),
            config.endpoint.api_token.clone(),
            config.http.request_timeout(),
        )?),
        (StoreKind::Local, _, Some(root)) => Box::new(LocalObjectStore::new(root.clone())),
        (kind, _, _) => {
            debug!(%kind, "No result store location configured; async polling disabled");
            return Ok(None);
        }
    };
    Ok(Some(backend))
}
