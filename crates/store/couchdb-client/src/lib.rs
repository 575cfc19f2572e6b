//! # CouchDB Document Store
//!
//! This crate provides an implementation of the `DocumentStore` trait on top of CouchDB's HTTP API.
//!
//! ## CouchDbClient
//!
//! Each stats run lives in its own CouchDB database (`artists_week_20240101`, ...), with one
//! document per user whose `_id` is the user id.
//!
//! **Endpoints used**:
//! - `GET /_all_dbs` to resolve a prefix to databases
//! - `PUT /{db}` / `DELETE /{db}` to create and drop databases
//! - `POST /{db}/_all_docs` to read current revisions before an upsert
//! - `POST /{db}/_bulk_docs` to write a batch
//! - `GET /{db}/{id}` to fetch a document
//!
//! ## Example
//!
//! ```rust,no_run
//! use couchdb_client::CouchDbClient;
//! use stats_core::DocumentStore;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = CouchDbClient::new("http://localhost:5984")?
//!         .with_credentials("admin".to_string(), "password".to_string());
//!
//!     let doc = client.fetch_data("artists_week", "1").await?;
//!     println!("{:?}", doc);
//!     Ok(())
//! }
//! ```

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use stats_core::{
    database_matches_prefix, sort_newest_first, DocumentStore, StatDocument, StoreError,
};
use tracing::{debug, info, warn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// CouchDB-backed document store.
#[derive(Debug, Clone)]
pub struct CouchDbClient {
    client: Client,
    base_url: Url,
    credentials: Option<(String, String)>,
}

impl CouchDbClient {
    /// Creates a client for the CouchDB server at `base_url` with a 30 second request timeout.
    pub fn new(base_url: &str) -> Result<Self, StoreError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Creates a client with a custom request timeout.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| StoreError::Transport(format!("invalid CouchDB URL {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::Transport(format!(
                "CouchDB URL cannot be a base: {}",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(transport_err)?;

        Ok(Self {
            client,
            base_url,
            credentials: None,
        })
    }

    /// Authenticates every request with HTTP basic auth.
    pub fn with_credentials(mut self, user: String, password: String) -> Self {
        self.credentials = Some((user, password));
        self
    }

    /// Returns the server URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let builder = self.client.request(method, self.url(segments));
        match &self.credentials {
            Some((user, password)) => builder.basic_auth(user, Some(password)),
            None => builder,
        }
    }

    async fn all_databases(&self) -> Result<Vec<String>, StoreError> {
        let response = self
            .request(Method::GET, &["_all_dbs"])
            .send()
            .await
            .map_err(transport_err)?;
        let response = error_for_status(response).await?;
        response.json().await.map_err(transport_err)
    }

    /// Current revision of each existing, non-deleted document among `ids`.
    async fn current_revisions(
        &self,
        database: &str,
        ids: Vec<&str>,
    ) -> Result<HashMap<String, String>, StoreError> {
        let response = self
            .request(Method::POST, &[database, "_all_docs"])
            .json(&AllDocsRequest { keys: ids })
            .send()
            .await
            .map_err(transport_err)?;
        let response = error_for_status(response).await?;
        let all_docs: AllDocsResponse = response.json().await.map_err(transport_err)?;

        Ok(all_docs
            .rows
            .into_iter()
            .filter_map(|row| match (row.id, row.value) {
                (Some(id), Some(value)) if !value.deleted => Some((id, value.rev)),
                _ => None,
            })
            .collect())
    }
}

fn transport_err(e: reqwest::Error) -> StoreError {
    StoreError::Transport(e.to_string())
}

/// Turns a non-2xx response into [`StoreError::Http`], keeping the body for diagnostics.
async fn error_for_status(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Http {
        status: status.as_u16(),
        body,
    })
}

#[derive(Debug, Serialize)]
struct AllDocsRequest<'a> {
    keys: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
struct AllDocsResponse {
    rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
struct AllDocsRow {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    value: Option<RevisionInfo>,
}

#[derive(Debug, Deserialize)]
struct RevisionInfo {
    rev: String,
    #[serde(default)]
    deleted: bool,
}

#[derive(Debug, Serialize)]
struct BulkDocsRequest {
    docs: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct BulkDocsResult {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

#[async_trait]
impl DocumentStore for CouchDbClient {
    async fn insert_data(&self, database: &str, docs: &[StatDocument]) -> Result<(), StoreError> {
        if docs.is_empty() {
            return Ok(());
        }

        let ids = docs.iter().map(|doc| doc.id.as_str()).collect();
        let revisions = self.current_revisions(database, ids).await?;

        let mut payload = Vec::with_capacity(docs.len());
        for doc in docs {
            let mut value = serde_json::to_value(doc)?;
            if let (Some(rev), Value::Object(map)) = (revisions.get(&doc.id), &mut value) {
                map.insert("_rev".to_string(), Value::String(rev.clone()));
            }
            payload.push(value);
        }

        info!(
            database = %database,
            count = payload.len(),
            updates = revisions.len(),
            "CouchDB bulk upsert"
        );

        let response = self
            .request(Method::POST, &[database, "_bulk_docs"])
            .json(&BulkDocsRequest { docs: payload })
            .send()
            .await
            .map_err(transport_err)?;
        let response = error_for_status(response).await?;
        let results: Vec<BulkDocsResult> = response.json().await.map_err(transport_err)?;

        let failures: Vec<String> = results
            .into_iter()
            .filter_map(|result| {
                result.error.map(|error| {
                    format!(
                        "{}: {} ({})",
                        result.id.unwrap_or_default(),
                        error,
                        result.reason.unwrap_or_default()
                    )
                })
            })
            .collect();

        if !failures.is_empty() {
            warn!(
                database = %database,
                failed = failures.len(),
                "CouchDB bulk upsert rejected documents"
            );
            return Err(StoreError::BulkConflict {
                database: database.to_string(),
                failures,
            });
        }

        Ok(())
    }

    async fn fetch_data(&self, prefix: &str, key: &str) -> Result<Option<Value>, StoreError> {
        let Some(database) = self.list_databases(prefix).await?.into_iter().next() else {
            debug!(prefix = %prefix, "No CouchDB database matches prefix");
            return Ok(None);
        };

        let response = self
            .request(Method::GET, &[database.as_str(), key])
            .send()
            .await
            .map_err(transport_err)?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(database = %database, key = %key, "CouchDB document not found");
            return Ok(None);
        }

        let response = error_for_status(response).await?;
        let document = response.json().await.map_err(transport_err)?;
        debug!(database = %database, key = %key, "CouchDB document fetched");
        Ok(Some(document))
    }

    async fn list_databases(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut databases: Vec<String> = self
            .all_databases()
            .await?
            .into_iter()
            .filter(|name| !name.starts_with('_') && database_matches_prefix(name, prefix))
            .collect();
        sort_newest_first(&mut databases);
        Ok(databases)
    }

    async fn create_database(&self, database: &str) -> Result<(), StoreError> {
        let response = self
            .request(Method::PUT, &[database])
            .send()
            .await
            .map_err(transport_err)?;

        if response.status() == StatusCode::PRECONDITION_FAILED {
            debug!(database = %database, "CouchDB database already exists");
            return Ok(());
        }

        error_for_status(response).await?;
        info!(database = %database, "CouchDB database created");
        Ok(())
    }

    async fn delete_database(&self, database: &str) -> Result<bool, StoreError> {
        let response = self
            .request(Method::DELETE, &[database])
            .send()
            .await
            .map_err(transport_err)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }

        error_for_status(response).await?;
        info!(database = %database, "CouchDB database deleted");
        Ok(true)
    }
}
