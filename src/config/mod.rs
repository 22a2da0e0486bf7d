//! Configuration system (layered: defaults < TOML file < environment).

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::DocextError;
use crate::prompt::DEFAULT_SYSTEM_PROMPT;
use crate::store::StoreKind;
use crate::types::request::check_unit_interval;
use crate::types::GenerationDefaults;

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "DOCEXT_CONFIG";

/// Full client configuration. Immutable once a client has been built from it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocextConfig {
    pub endpoint: EndpointConfig,
    pub store: StoreConfig,
    pub generation: GenerationDefaults,
    pub prompt: PromptConfig,
    pub polling: PollingConfig,
    pub batch: BatchConfig,
    pub http: HttpConfig,
}

/// Endpoint identity and the ambient credential used to reach it.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub name: String,
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
}

impl fmt::Debug for EndpointConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointConfig")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("api_token", &self.api_token.as_ref().map(|_| ".."))
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub kind: StoreKind,
    pub base_url: Option<String>,
    pub root: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Wrap bare prompts in the chat template before sending.
    pub chat_template: bool,
    pub system: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            chat_template: true,
            system: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_secs: u64,
    pub timeout_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            timeout_secs: 300,
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Pause between consecutive calls of a batch.
    pub delay_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { delay_ms: 1000 }
    }
}

impl BatchConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 120,
        }
    }
}

impl HttpConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> Result<T, DocextError>
where
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| DocextError::Configuration(format!("invalid {name}={value:?}: {e}")))
}

impl DocextConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, DocextError> {
        toml::from_str(source)
            .map_err(|e| DocextError::Configuration(format!("invalid config file: {e}")))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DocextError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            DocextError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&source)
    }

    /// `<config dir>/docext/config.toml` for the current user, if resolvable.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "docext")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load configuration: explicit path, else `DOCEXT_CONFIG`, else the
    /// default path when it exists; then environment overrides. A `.env`
    /// file is honored if present.
    pub fn load(path: Option<&Path>) -> Result<Self, DocextError> {
        let _ = dotenvy::dotenv();

        let file = match path {
            Some(p) => Some(p.to_path_buf()),
            None => std::env::var_os(CONFIG_PATH_ENV)
                .map(PathBuf::from)
                .or_else(|| Self::default_path().filter(|p| p.exists())),
        };

        let mut config = match file {
            Some(file) => {
                debug!(path = %file.display(), "Loading config file");
                Self::from_file(file)?
            }
            None => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `DOCEXT_*` environment variables.
    pub fn apply_env(&mut self) -> Result<(), DocextError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from any variable lookup (environment or otherwise).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), DocextError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("DOCEXT_ENDPOINT_NAME") {
            self.endpoint.name = v;
        }
        if let Some(v) = lookup("DOCEXT_ENDPOINT_URL") {
            self.endpoint.base_url = v;
        }
        if let Some(v) = lookup("DOCEXT_API_TOKEN") {
            self.endpoint.api_token = Some(v);
        }
        if let Some(v) = lookup("DOCEXT_STORE_KIND") {
            self.store.kind = parse_var("DOCEXT_STORE_KIND", &v)?;
        }
        if let Some(v) = lookup("DOCEXT_STORE_URL") {
            self.store.base_url = Some(v);
        }
        if let Some(v) = lookup("DOCEXT_STORE_ROOT") {
            self.store.root = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("DOCEXT_POLL_INTERVAL_SECS") {
            self.polling.interval_secs = parse_var("DOCEXT_POLL_INTERVAL_SECS", &v)?;
        }
        if let Some(v) = lookup("DOCEXT_POLL_TIMEOUT_SECS") {
            self.polling.timeout_secs = parse_var("DOCEXT_POLL_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("DOCEXT_BATCH_DELAY_MS") {
            self.batch.delay_ms = parse_var("DOCEXT_BATCH_DELAY_MS", &v)?;
        }
        Ok(())
    }

    /// Reject configurations a client cannot be built from.
    pub fn validate(&self) -> Result<(), DocextError> {
        let invalid = |msg: &str| Err(DocextError::Configuration(msg.to_string()));

        if self.endpoint.name.trim().is_empty() {
            return invalid("endpoint.name is required");
        }
        if self.endpoint.base_url.trim().is_empty() {
            return invalid("endpoint.base_url is required");
        }
        if self.polling.interval_secs == 0 {
            return invalid("polling.interval_secs must be greater than zero");
        }
        if self.generation.max_tokens == 0 {
            return invalid("generation.max_tokens must be greater than zero");
        }
        check_unit_interval("generation.temperature", self.generation.temperature)
            .and_then(|_| check_unit_interval("generation.top_p", self.generation.top_p))
            .map_err(|e| DocextError::Configuration(e.to_string()))?;
        Ok(())
    }

    /// Whether the selected store kind has the location it needs for polling.
    pub fn has_store(&self) -> bool {
        match self.store.kind {
            StoreKind::Http => self.store.base_url.is_some(),
            StoreKind::Local => self.store.root.is_some(),
        }
    }
}
