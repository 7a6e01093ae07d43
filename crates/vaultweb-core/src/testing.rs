//! Test doubles: an in-memory store behind [`Transport`] and a recording [`ErrorLogger`]

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Semaphore;

use crate::error::{CoreError, CoreResult, ErrorContext, ErrorLogger};
use crate::store::{Operation, StoreRequest, Transport};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Store that keeps its listing in memory and records every request it receives
#[derive(Debug)]
pub struct MemoryTransport {
    listing: Mutex<Value>,
    calls: Mutex<Vec<StoreRequest>>,
    failing: Mutex<HashSet<Operation>>,
    empty: Mutex<HashSet<Operation>>,
    held: Mutex<HashSet<Operation>>,
    /// One permit per held request allowed to answer
    gate: Semaphore,
    next_id: Mutex<u64>,
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::with_listing(json!({}))
    }

    /// Start from a listing body exactly as the store would return it
    pub fn with_listing(listing: Value) -> Self {
        Self {
            listing: Mutex::new(listing),
            calls: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
            empty: Mutex::new(HashSet::new()),
            held: Mutex::new(HashSet::new()),
            gate: Semaphore::new(0),
            next_id: Mutex::new(0),
        }
    }

    /// Keep requests for `operation` waiting, after they are recorded, until
    /// [`release`](Self::release) lets one through
    pub fn hold(&self, operation: Operation) {
        lock(&self.held).insert(operation);
    }

    pub fn release(&self) {
        self.gate.add_permits(1);
    }

    /// Make every request for `operation` fail until [`recover`](Self::recover)
    pub fn fail(&self, operation: Operation) {
        lock(&self.failing).insert(operation);
    }

    pub fn recover(&self, operation: Operation) {
        lock(&self.failing).remove(&operation);
    }

    /// Answer `operation` with an empty body instead of JSON
    pub fn answer_empty(&self, operation: Operation) {
        lock(&self.empty).insert(operation);
    }

    pub fn calls(&self) -> Vec<StoreRequest> {
        lock(&self.calls).clone()
    }

    pub fn operations(&self) -> Vec<Operation> {
        lock(&self.calls).iter().map(|c| c.operation).collect()
    }

    pub fn clear_calls(&self) {
        lock(&self.calls).clear();
    }

    pub fn listing(&self) -> Value {
        lock(&self.listing).clone()
    }

    fn apply(&self, request: &StoreRequest) -> CoreResult<Value> {
        let operation = request.operation;
        if operation == Operation::List {
            return Ok(self.listing());
        }

        let body = request
            .body
            .as_ref()
            .and_then(Value::as_object)
            .ok_or_else(|| CoreError::request_failed(operation, "missing JSON body"))?;
        let field = |key: &str| -> CoreResult<String> {
            body.get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| CoreError::request_failed(operation, format!("missing {}", key)))
        };

        let mut listing = lock(&self.listing);
        let Some(entries) = listing.as_object_mut() else {
            return Err(CoreError::request_failed(operation, "listing is not an object"));
        };

        let action = match operation {
            Operation::Create => {
                let id = self.fresh_id(entries);
                entries.insert(id, record(field("name")?, field("url")?, field("password")?));
                "added"
            }
            Operation::Update => {
                let id = field("id")?;
                let Some(slot) = entries.get_mut(&id) else {
                    return Err(CoreError::request_failed(operation, format!("unknown id {}", id)));
                };
                *slot = record(field("name")?, field("url")?, field("password")?);
                "edited"
            }
            Operation::Delete => {
                entries.remove(&field("id")?);
                "deleted"
            }
            Operation::List => unreachable!("handled above"),
        };

        Ok(json!({"status": "success", "action": action}))
    }

    fn fresh_id(&self, entries: &Map<String, Value>) -> String {
        let mut next = lock(&self.next_id);
        loop {
            *next += 1;
            let id = format!("new-{}", *next);
            if !entries.contains_key(&id) {
                return id;
            }
        }
    }
}

fn record(name: String, url: String, password: String) -> Value {
    json!({"name": name, "url": url, "password": password})
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send(&self, request: StoreRequest) -> CoreResult<Option<Value>> {
        lock(&self.calls).push(request.clone());

        let held = lock(&self.held).contains(&request.operation);
        if held {
            if let Ok(permit) = self.gate.acquire().await {
                permit.forget();
            }
        }

        if lock(&self.failing).contains(&request.operation) {
            return Err(CoreError::request_failed(request.operation, "HTTP 500 Internal Server Error"));
        }

        let response = self.apply(&request)?;
        if lock(&self.empty).contains(&request.operation) {
            return Ok(None);
        }
        Ok(Some(response))
    }
}

/// Logger that keeps what it was asked to report
#[derive(Debug, Default)]
pub struct RecordingLogger {
    errors: Mutex<Vec<CoreError>>,
    warnings: Mutex<Vec<String>>,
}

impl RecordingLogger {
    pub fn errors(&self) -> Vec<CoreError> {
        lock(&self.errors).clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        lock(&self.warnings).clone()
    }
}

impl ErrorLogger for RecordingLogger {
    fn log_error(&self, error: &CoreError, _context: &ErrorContext) {
        lock(&self.errors).push(error.clone());
    }

    fn log_warning(&self, message: &str, _context: &ErrorContext) {
        lock(&self.warnings).push(message.to_string());
    }
}
