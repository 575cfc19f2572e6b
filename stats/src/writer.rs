//! Stats writer: turns payloads from the stats jobs into documents and upserts them.
//!
//! Every document gets `_id`, `from_ts`, `to_ts` and `last_updated` from the call, never from
//! the payload. Store failures are returned to the caller; nothing is retried here.

use std::sync::Arc;

use serde_json::{Map, Value};
use stats_core::{
    Clock, DocumentStore, Scope, StatDocument, StatPayload, SystemClock, WriteError,
    SITEWIDE_STATS_USER_ID,
};
use tracing::info;

#[derive(Clone)]
pub struct StatsWriter {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
}

impl StatsWriter {
    /// Creates a writer stamping documents with the system clock.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Inserts one document per payload into `database`, overwriting earlier documents of the
    /// same users.
    ///
    /// # Errors
    ///
    /// - [`WriteError::ReservedUserId`] if a payload uses the sitewide id; nothing is written.
    /// - [`WriteError::Payload`] if a payload's `count` is not an integer; nothing is written.
    /// - [`WriteError::Store`] if the store rejects the batch.
    pub async fn insert_stats(
        &self,
        database: &str,
        from_ts: i64,
        to_ts: i64,
        values: Vec<StatPayload>,
    ) -> Result<(), WriteError> {
        let mut docs = Vec::with_capacity(values.len());
        for payload in values {
            if payload.user_id == SITEWIDE_STATS_USER_ID {
                return Err(WriteError::ReservedUserId(payload.user_id));
            }
            let scope = Scope::User(payload.user_id);
            docs.push(self.build_document(scope, payload.fields, from_ts, to_ts)?);
        }
        self.write(database, docs).await
    }

    /// Inserts the sitewide statistic into `database`. Any `user_id` in the payload is ignored.
    pub async fn insert_sitewide_stats(
        &self,
        database: &str,
        from_ts: i64,
        to_ts: i64,
        payload: Map<String, Value>,
    ) -> Result<(), WriteError> {
        let doc = self.build_document(Scope::Sitewide, payload, from_ts, to_ts)?;
        self.write(database, vec![doc]).await
    }

    fn build_document(
        &self,
        scope: Scope,
        fields: Map<String, Value>,
        from_ts: i64,
        to_ts: i64,
    ) -> Result<StatDocument, WriteError> {
        StatDocument::from_fields(scope.user_id(), fields, from_ts, to_ts, self.clock.now())
    }

    async fn write(&self, database: &str, docs: Vec<StatDocument>) -> Result<(), WriteError> {
        if docs.is_empty() {
            return Ok(());
        }

        self.store.create_database(database).await?;
        self.store.insert_data(database, &docs).await?;

        info!(database = %database, count = docs.len(), "Inserted stats");
        Ok(())
    }
}
