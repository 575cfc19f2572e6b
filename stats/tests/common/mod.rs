//! Shared test utilities for stats integration tests.
//!
//! Provides FailingStore (a DocumentStore whose every call fails like an unhealthy CouchDB) and
//! a capture of ERROR events and their fields used to assert how failures are logged.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use stats_core::{DocumentStore, StatDocument, StoreError};
use tracing::field::{Field, Visit};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

/// Store that answers every request with HTTP 500.
#[allow(dead_code)]
pub struct FailingStore;

fn server_error() -> StoreError {
    StoreError::Http {
        status: 500,
        body: r#"{"error": "internal_server_error"}"#.to_string(),
    }
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn insert_data(&self, _database: &str, _docs: &[StatDocument]) -> Result<(), StoreError> {
        Err(server_error())
    }

    async fn fetch_data(&self, _prefix: &str, _key: &str) -> Result<Option<Value>, StoreError> {
        Err(server_error())
    }

    async fn list_databases(&self, _prefix: &str) -> Result<Vec<String>, StoreError> {
        Err(server_error())
    }

    async fn create_database(&self, _database: &str) -> Result<(), StoreError> {
        Err(server_error())
    }

    async fn delete_database(&self, _database: &str) -> Result<bool, StoreError> {
        Err(server_error())
    }
}

/// Fields of one ERROR event, keyed by field name. `message` holds the log message.
pub type ErrorFields = HashMap<String, String>;

#[derive(Default)]
struct FieldRecorder(ErrorFields);

impl Visit for FieldRecorder {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0.insert(field.name().to_string(), format!("{:?}", value));
    }
}

struct ErrorCapture(Arc<Mutex<Vec<ErrorFields>>>);

impl<S: Subscriber> Layer<S> for ErrorCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::ERROR {
            let mut recorder = FieldRecorder::default();
            event.record(&mut recorder);
            self.0.lock().unwrap().push(recorder.0);
        }
    }
}

/// ERROR events captured on the current thread.
#[derive(Clone, Default)]
#[allow(dead_code)]
pub struct CapturedErrors(Arc<Mutex<Vec<ErrorFields>>>);

#[allow(dead_code)]
impl CapturedErrors {
    pub fn count(&self) -> usize {
        self.0.lock().unwrap().len()
    }

    pub fn events(&self) -> Vec<ErrorFields> {
        self.0.lock().unwrap().clone()
    }
}

/// Captures ERROR events on the current thread until the guard is dropped.
#[allow(dead_code)]
pub fn capture_error_logs() -> (CapturedErrors, DefaultGuard) {
    let captured = CapturedErrors::default();
    let subscriber = tracing_subscriber::registry().with(ErrorCapture(captured.0.clone()));
    let guard = tracing::subscriber::set_default(subscriber);
    (captured, guard)
}
