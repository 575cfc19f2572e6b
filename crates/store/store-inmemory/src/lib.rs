//! # In-Memory Document Store
//!
//! This crate provides an in-memory implementation of the `DocumentStore` trait from
//! `stats-core`.
//!
//! ## InMemoryDocumentStore
//!
//! Simple in-memory storage for testing and development.
//!
//! **Advantages**:
//! - No I/O, no setup
//! - Inspectable from tests
//!
//! **Limitations**:
//! - Data is lost on restart
//! - Not suitable for production use
//!
//! ## Example
//!
//! ```rust
//! use chrono::Utc;
//! use serde_json::Map;
//! use stats_core::{DocumentStore, StatDocument};
//! use store_inmemory::InMemoryDocumentStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = InMemoryDocumentStore::new();
//!     let doc = StatDocument::from_fields(7, Map::new(), 100, 200, Utc::now())?;
//!
//!     store.insert_data("artists_week_20240101", &[doc]).await?;
//!     assert!(store.fetch_data("artists_week", "7").await?.is_some());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Thread Safety
//!
//! The store uses `Arc<RwLock<>>` to ensure thread-safe concurrent access.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use stats_core::{
    database_matches_prefix, sort_newest_first, DocumentStore, StatDocument, StoreError,
};
use tokio::sync::RwLock;
use tracing::{debug, info};

type Database = HashMap<String, Value>;

/// In-memory document store for testing and development.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentStore {
    databases: Arc<RwLock<HashMap<String, Database>>>,
}

impl InMemoryDocumentStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of documents in `database` (0 if it does not exist).
    pub async fn len(&self, database: &str) -> usize {
        let databases = self.databases.read().await;
        databases.get(database).map(|db| db.len()).unwrap_or(0)
    }

    /// Returns true if no database holds any document.
    pub async fn is_empty(&self) -> bool {
        let databases = self.databases.read().await;
        databases.values().all(|db| db.is_empty())
    }

    /// Returns a copy of the raw document stored under `key` in exactly `database`.
    pub async fn get(&self, database: &str, key: &str) -> Option<Value> {
        let databases = self.databases.read().await;
        databases.get(database).and_then(|db| db.get(key)).cloned()
    }

    /// Stores a raw document as-is, bypassing [`StatDocument`]. Lets tests plant malformed data.
    pub async fn put_raw(&self, database: &str, key: &str, document: Value) {
        let mut databases = self.databases.write().await;
        databases
            .entry(database.to_string())
            .or_default()
            .insert(key.to_string(), document);
    }

    /// Clears all databases.
    pub async fn clear(&self) {
        let mut databases = self.databases.write().await;
        databases.clear();
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn insert_data(&self, database: &str, docs: &[StatDocument]) -> Result<(), StoreError> {
        let mut encoded = Vec::with_capacity(docs.len());
        for doc in docs {
            encoded.push((doc.id.clone(), serde_json::to_value(doc)?));
        }

        let mut databases = self.databases.write().await;
        let db = databases.entry(database.to_string()).or_default();
        for (id, value) in encoded {
            db.insert(id, value);
        }
        drop(databases);

        info!(database = %database, count = docs.len(), "Documents written to in-memory store");
        Ok(())
    }

    async fn fetch_data(&self, prefix: &str, key: &str) -> Result<Option<Value>, StoreError> {
        let Some(database) = self.list_databases(prefix).await?.into_iter().next() else {
            return Ok(None);
        };

        let result = self.get(&database, key).await;
        debug!(
            database = %database,
            key = %key,
            found = result.is_some(),
            "In-memory store fetch returned"
        );
        Ok(result)
    }

    async fn list_databases(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let databases = self.databases.read().await;
        let mut names: Vec<String> = databases
            .keys()
            .filter(|name| database_matches_prefix(name, prefix))
            .cloned()
            .collect();
        sort_newest_first(&mut names);
        Ok(names)
    }

    async fn create_database(&self, database: &str) -> Result<(), StoreError> {
        let mut databases = self.databases.write().await;
        databases.entry(database.to_string()).or_default();
        Ok(())
    }

    async fn delete_database(&self, database: &str) -> Result<bool, StoreError> {
        let mut databases = self.databases.write().await;
        Ok(databases.remove(database).is_some())
    }
}
