//! Inference client: direct invocation, asynchronous submit-then-poll, and
//! the single-shot fallback between them.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::DocextConfig;
use crate::endpoint::{
    create_endpoint, decode_generated_text, strip_prompt_echo, InferenceEndpoint, RequestEnvelope,
};
use crate::error::DocextError;
use crate::prompt::{format_prompt, DEFAULT_SYSTEM_PROMPT};
use crate::store::{create_store, ResultStore};
use crate::types::{AsyncHandle, FailureReason, GenerationDefaults, GenerationRequest, GenerationResult};

/// Cadence and budget for polling an asynchronous result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            timeout: Duration::from_secs(300),
        }
    }
}

/// Client for one text-generation endpoint and its result store.
///
/// Holds only immutable configuration; every call is independent.
pub struct InferenceClient {
    endpoint: Box<dyn InferenceEndpoint>,
    /// Absent when no store location is configured; only direct invocation works then.
    store: Option<Box<dyn ResultStore>>,
    defaults: GenerationDefaults,
    /// System instruction for the chat template; `None` sends prompts verbatim.
    system_prompt: Option<String>,
    polling: PollSettings,
    batch_delay: Duration,
}

impl InferenceClient {
    pub fn new(endpoint: Box<dyn InferenceEndpoint>, store: Box<dyn ResultStore>) -> Self {
        Self::with_optional_store(endpoint, Some(store))
    }

    /// A client without a result store: every call goes to the sync endpoint.
    pub fn sync_only(endpoint: Box<dyn InferenceEndpoint>) -> Self {
        Self::with_optional_store(endpoint, None)
    }

    fn with_optional_store(
        endpoint: Box<dyn InferenceEndpoint>,
        store: Option<Box<dyn ResultStore>>,
    ) -> Self {
        Self {
            endpoint,
            store,
            defaults: GenerationDefaults::default(),
            system_prompt: Some(DEFAULT_SYSTEM_PROMPT.to_string()),
            polling: PollSettings::default(),
            batch_delay: Duration::from_secs(1),
        }
    }

    /// Build the endpoint and store backends selected by `config`.
    pub fn from_config(config: &DocextConfig) -> Result<Self, DocextError> {
        config.validate()?;
        let client = Self::with_optional_store(create_endpoint(config)?, create_store(config)?)
            .with_defaults(config.generation.clone())
            .with_polling(PollSettings {
                interval: config.polling.interval(),
                timeout: config.polling.timeout(),
            })
            .with_batch_delay(config.batch.delay());
        Ok(if config.prompt.chat_template {
            client.with_system_prompt(config.prompt.system.clone())
        } else {
            client.without_chat_template()
        })
    }

    pub fn with_defaults(mut self, defaults: GenerationDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_system_prompt(mut self, system: impl Into<String>) -> Self {
        self.system_prompt = Some(system.into());
        self
    }

    /// Send prompts exactly as given, without the chat template.
    pub fn without_chat_template(mut self) -> Self {
        self.system_prompt = None;
        self
    }

    pub fn with_polling(mut self, polling: PollSettings) -> Self {
        self.polling = polling;
        self
    }

    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }

    /// Whether asynchronous results can be polled.
    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }

    pub fn endpoint_name(&self) -> &str {
        self.endpoint.name()
    }

    pub fn defaults(&self) -> &GenerationDefaults {
        &self.defaults
    }

    pub fn polling(&self) -> PollSettings {
        self.polling
    }

    pub fn batch_delay(&self) -> Duration {
        self.batch_delay
    }

    /// A request for `prompt` carrying this client's default parameters.
    pub fn request(&self, prompt: impl Into<String>) -> GenerationRequest {
        self.defaults.request(prompt)
    }

    fn formatted_prompt(&self, request: &GenerationRequest) -> String {
        match &self.system_prompt {
            Some(system) => format_prompt(system, &request.prompt),
            None => request.prompt.clone(),
        }
    }

    /// Invoke the endpoint directly and wait for the generated text.
    ///
    /// Never retries: transport, auth and envelope failures surface as errors.
    pub async fn invoke_sync(&self, request: &GenerationRequest) -> Result<GenerationResult, DocextError> {
        request.validate()?;
        let inputs = self.formatted_prompt(request);
        let envelope = RequestEnvelope::new(inputs.clone(), request);

        debug!(endpoint = self.endpoint.name(), "invoke_sync");
        let body = self.endpoint.invoke(&envelope).await?;
        let text = decode_generated_text(&body)?;
        Ok(GenerationResult::Text(strip_prompt_echo(text, &inputs)))
    }

    /// Submit to the asynchronous entry point; the handle says where the result will appear.
    pub async fn submit_async(&self, request: &GenerationRequest) -> Result<AsyncHandle, DocextError> {
        request.validate()?;
        let envelope = RequestEnvelope::new(self.formatted_prompt(request), request);

        debug!(endpoint = self.endpoint.name(), "submit_async");
        let handle = self.endpoint.invoke_async(&envelope).await?;
        info!(
            endpoint = self.endpoint.name(),
            location = %handle.location,
            "Async submission accepted"
        );
        Ok(handle)
    }

    /// Poll `handle.location` until the result appears or `timeout` elapses.
    ///
    /// Only "not found" is retried. Any other store error ends polling
    /// immediately. Exceeding the budget yields
    /// [`GenerationResult::Failure`] with [`FailureReason::Timeout`]. Polling
    /// only reads, so abandoning the future at any point leaves no trace.
    pub async fn await_result(
        &self,
        handle: &AsyncHandle,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<GenerationResult, DocextError> {
        if poll_interval.is_zero() {
            return Err(DocextError::InvalidArgument(
                "poll_interval must be greater than zero".into(),
            ));
        }

        let store = self.store.as_deref().ok_or_else(|| {
            DocextError::Configuration("no result store configured for polling".into())
        })?;

        let location = &handle.location;
        let started = Instant::now();
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            debug!(%location, attempt = attempts, "Polling for async result");

            if let Some(body) = store.fetch(location).await? {
                let elapsed = started.elapsed();
                info!(
                    %location,
                    attempts,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Async result available"
                );
                return Ok(GenerationResult::Text(decode_generated_text(&body)?));
            }

            let remaining = timeout.saturating_sub(started.elapsed());
            if remaining.is_zero() {
                break;
            }
            // Never sleep past the deadline.
            tokio::time::sleep(poll_interval.min(remaining)).await;
            if started.elapsed() >= timeout {
                break;
            }
        }

        let waited = started.elapsed();
        warn!(
            %location,
            attempts,
            elapsed_ms = waited.as_millis() as u64,
            "Timed out waiting for async result"
        );
        Ok(GenerationResult::Failure(FailureReason::Timeout {
            waited,
            attempts,
            location: location.clone(),
        }))
    }

    /// [`await_result`](Self::await_result) with this client's configured polling.
    pub async fn poll_result(&self, handle: &AsyncHandle) -> Result<GenerationResult, DocextError> {
        self.await_result(handle, self.polling.timeout, self.polling.interval)
            .await
    }

    /// Run one request. With `prefer_async` and a result store, submit and
    /// poll; if the submission itself fails, fall back to exactly one
    /// synchronous call. Without a store the sync endpoint is used directly.
    pub async fn infer(
        &self,
        request: &GenerationRequest,
        prefer_async: bool,
    ) -> Result<GenerationResult, DocextError> {
        if !prefer_async || self.store.is_none() {
            info!(endpoint = self.endpoint.name(), "Using sync endpoint for inference");
            return self.invoke_sync(request).await;
        }

        info!(endpoint = self.endpoint.name(), "Using async endpoint for inference");
        match self.submit_async(request).await {
            Ok(handle) => self.poll_result(&handle).await,
            Err(DocextError::InvalidArgument(msg)) => Err(DocextError::InvalidArgument(msg)),
            Err(e) => {
                warn!(error = %e, "Async submission failed, falling back to sync");
                self.invoke_sync(request).await
            }
        }
    }

    /// Convenience for [`infer`](Self::infer) on a bare prompt with default parameters.
    pub async fn infer_prompt(
        &self,
        prompt: impl Into<String>,
        prefer_async: bool,
    ) -> Result<GenerationResult, DocextError> {
        let request = self.request(prompt);
        self.infer(&request, prefer_async).await
    }

    /// Run requests one after another, pausing between calls to respect
    /// endpoint rate limits. A failed item does not stop the batch.
    pub async fn batch_infer(
        &self,
        requests: &[GenerationRequest],
        prefer_async: bool,
    ) -> Vec<Result<GenerationResult, DocextError>> {
        let total = requests.len();
        let mut results = Vec::with_capacity(total);

        for (index, request) in requests.iter().enumerate() {
            info!(index = index + 1, total, "Processing prompt");
            let result = self.infer(request, prefer_async).await;
            if let Err(e) = &result {
                warn!(index = index + 1, error = %e, "Batch item failed");
            }
            results.push(result);

            if index + 1 < total && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }
        }

        results
    }
}
