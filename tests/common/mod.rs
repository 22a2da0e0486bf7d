//! Shared test helpers: scripted endpoint and store doubles.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use docext::client::InferenceClient;
use docext::endpoint::{InferenceEndpoint, RequestEnvelope};
use docext::error::DocextError;
use docext::store::ResultStore;
use docext::types::{AsyncHandle, ResultLocation};

/// Body the endpoint returns for `text`.
pub fn generated(text: &str) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!([{ "generated_text": text }])).unwrap()
}

pub fn location(key: &str) -> ResultLocation {
    ResultLocation::new("s3", "results", key)
}

pub fn handle(key: &str) -> AsyncHandle {
    AsyncHandle::new(location(key))
}

/// A client over the two doubles; clones of the doubles stay observable.
pub fn client(endpoint: &MockEndpoint, store: &MockStore) -> InferenceClient {
    InferenceClient::new(Box::new(endpoint.clone()), Box::new(store.clone()))
}

#[derive(Default)]
struct EndpointState {
    sync_responses: Mutex<VecDeque<Result<Vec<u8>, DocextError>>>,
    async_responses: Mutex<VecDeque<Result<AsyncHandle, DocextError>>>,
    sync_calls: AtomicUsize,
    async_calls: AtomicUsize,
    envelopes: Mutex<Vec<RequestEnvelope>>,
}

/// An endpoint that replays queued responses and counts calls.
///
/// Clones share state, so a test can keep one clone after boxing another.
#[derive(Clone, Default)]
pub struct MockEndpoint {
    state: Arc<EndpointState>,
}

impl MockEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_sync(&self, response: Result<Vec<u8>, DocextError>) {
        self.state.sync_responses.lock().unwrap().push_back(response);
    }

    pub fn queue_text(&self, text: &str) {
        self.queue_sync(Ok(generated(text)));
    }

    pub fn queue_async(&self, response: Result<AsyncHandle, DocextError>) {
        self.state.async_responses.lock().unwrap().push_back(response);
    }

    pub fn sync_calls(&self) -> usize {
        self.state.sync_calls.load(Ordering::SeqCst)
    }

    pub fn async_calls(&self) -> usize {
        self.state.async_calls.load(Ordering::SeqCst)
    }

    pub fn envelopes(&self) -> Vec<RequestEnvelope> {
        self.state.envelopes.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceEndpoint for MockEndpoint {
    fn name(&self) -> &str {
        "mock-endpoint"
    }

    async fn invoke(&self, envelope: &RequestEnvelope) -> Result<Vec<u8>, DocextError> {
        self.state.sync_calls.fetch_add(1, Ordering::SeqCst);
        self.state.envelopes.lock().unwrap().push(envelope.clone());
        self.state
            .sync_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(DocextError::api(500, "no scripted sync response")))
    }

    async fn invoke_async(&self, envelope: &RequestEnvelope) -> Result<AsyncHandle, DocextError> {
        self.state.async_calls.fetch_add(1, Ordering::SeqCst);
        self.state.envelopes.lock().unwrap().push(envelope.clone());
        self.state
            .async_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(DocextError::api(500, "no scripted async response")))
    }
}

#[derive(Default)]
struct StoreState {
    scripted: Mutex<VecDeque<Result<Option<Vec<u8>>, DocextError>>>,
    objects: Mutex<Vec<(ResultLocation, Vec<u8>)>>,
    polls: AtomicUsize,
}

/// A store that replays scripted fetch outcomes, then serves stored objects.
#[derive(Clone, Default)]
pub struct MockStore {
    state: Arc<StoreState>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next fetch returns `outcome`, regardless of location.
    pub fn queue_fetch(&self, outcome: Result<Option<Vec<u8>>, DocextError>) {
        self.state.scripted.lock().unwrap().push_back(outcome);
    }

    /// Queue `n` "not found" answers.
    pub fn queue_missing(&self, n: usize) {
        for _ in 0..n {
            self.queue_fetch(Ok(None));
        }
    }

    pub fn put(&self, location: ResultLocation, body: Vec<u8>) {
        self.state.objects.lock().unwrap().push((location, body));
    }

    pub fn polls(&self) -> usize {
        self.state.polls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResultStore for MockStore {
    async fn fetch(&self, location: &ResultLocation) -> Result<Option<Vec<u8>>, DocextError> {
        self.state.polls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.state.scripted.lock().unwrap().pop_front();
        if let Some(outcome) = scripted {
            return outcome;
        }
        Ok(self
            .state
            .objects
            .lock()
            .unwrap()
            .iter()
            .find(|(loc, _)| loc == location)
            .map(|(_, body)| body.clone()))
    }
}
