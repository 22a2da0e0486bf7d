//! Result store backed by a local directory: `{root}/{container}/{key}`.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::error::DocextError;
use crate::types::ResultLocation;

use super::ResultStore;

pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a location under the root, refusing paths that escape it.
    fn object_path(&self, location: &ResultLocation) -> Result<PathBuf, DocextError> {
        let relative = Path::new(&location.container).join(&location.key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if escapes {
            return Err(DocextError::InvalidLocation(location.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ResultStore for LocalObjectStore {
    async fn fetch(&self, location: &ResultLocation) -> Result<Option<Vec<u8>>, DocextError> {
        let path = self.object_path(location)?;
        debug!(%location, path = %path.display(), "Reading result object");
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DocextError::storage(location, e.to_string())),
        }
    }
}
