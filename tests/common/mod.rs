//! In-memory transport shared by the integration tests

#![allow(dead_code)]

use amocrm_sdk::api::{Account, Method, Transport, TransportError};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub path: String,
    pub method: Method,
    pub params: Value,
}

/// Records every call and answers from a script. Without a scripted answer it echoes
/// one `{"id": n}` record per entity in the request.
#[derive(Default)]
pub struct RecordingTransport {
    calls: Mutex<Vec<RecordedCall>>,
    responses: Mutex<VecDeque<Option<Value>>>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    next_id: AtomicUsize,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self {
            next_id: AtomicUsize::new(1000),
            ..Default::default()
        }
    }

    /// Hold every request for `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn respond(self, response: Option<Value>) -> Self {
        self.lock_responses().push_back(response);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Highest number of requests seen running at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn lock_responses(&self) -> std::sync::MutexGuard<'_, VecDeque<Option<Value>>> {
        self.responses.lock().unwrap()
    }

    fn echo(&self, path: &str, params: &Value) -> Option<Value> {
        let count = params.as_array().map(Vec::len).unwrap_or(1);
        let records: Vec<Value> = (0..count)
            .map(|_| json!({"id": self.next_id.fetch_add(1, Ordering::SeqCst)}))
            .collect();
        let container = path.rsplit('/').next().unwrap_or("items").to_string();
        Some(json!({"_embedded": {container: records}}))
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn request(
        &self,
        _account: &Account,
        path: &str,
        method: Method,
        params: Value,
    ) -> Result<Option<Value>, TransportError> {
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        self.calls.lock().unwrap().push(RecordedCall {
            path: path.to_string(),
            method,
            params: params.clone(),
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self.lock_responses().pop_front();
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        Ok(match scripted {
            Some(response) => response,
            None => self.echo(path, &params),
        })
    }
}

pub fn account() -> Account {
    Account::new("example")
}
