//! # Document Store
//!
//! This module defines the interface of the schema-flexible document store that statistics are
//! persisted in. Documents are addressed by database name plus a string key (the user id).
//!
//! The `DocumentStore` trait is implemented by storage backends (CouchDB, SQLite, in-memory).
//!
//! ## Database resolution
//!
//! Stats jobs write each run into its own database, e.g. `artists_week_20240101`. Readers only
//! know the prefix (`artists_week`); [`DocumentStore::fetch_data`] resolves it to the newest
//! matching database, see [`database_matches_prefix`].

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreError;
use crate::types::StatDocument;

/// Trait for writing and fetching statistics documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Upserts all documents into `database`. A document replaces any existing one with the same id.
    async fn insert_data(&self, database: &str, docs: &[StatDocument]) -> Result<(), StoreError>;

    /// Fetches the raw document stored under `key` in the newest database matching `prefix`.
    /// Returns `None` if no database matches or the newest one has no such document.
    async fn fetch_data(&self, prefix: &str, key: &str) -> Result<Option<Value>, StoreError>;

    /// Lists databases matching `prefix`, newest first.
    async fn list_databases(&self, prefix: &str) -> Result<Vec<String>, StoreError>;

    /// Creates `database` if it does not exist yet.
    async fn create_database(&self, database: &str) -> Result<(), StoreError>;

    /// Drops `database` and its documents. Returns `false` if it did not exist.
    async fn delete_database(&self, database: &str) -> Result<bool, StoreError>;
}

/// Whether `database` belongs to the stats identified by `prefix`: the names are equal, or the
/// database name continues the prefix with an `_` separator. An empty prefix matches everything.
pub fn database_matches_prefix(database: &str, prefix: &str) -> bool {
    if prefix.is_empty() {
        return true;
    }
    match database.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('_'),
        None => false,
    }
}

/// Sorts database names newest first. Names end in `YYYYMMDD`, so lexicographic order is
/// chronological.
pub fn sort_newest_first(databases: &mut [String]) {
    databases.sort_unstable_by(|a, b| b.cmp(a));
}
