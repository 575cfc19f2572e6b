//! Store config: which backend to use and how to reach it. Loaded from env.

use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use couchdb_client::CouchDbClient;
use stats_core::DocumentStore;
use storage::DocumentRepository;
use store_inmemory::InMemoryDocumentStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    CouchDb,
    Sqlite,
    /// Process-local; only useful for trying the CLI out.
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "couchdb" => Ok(StoreBackend::CouchDb),
            "sqlite" => Ok(StoreBackend::Sqlite),
            "memory" => Ok(StoreBackend::Memory),
            other => anyhow::bail!(
                "STATS_STORE must be one of couchdb, sqlite, memory (got {})",
                other
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StatsConfig {
    /// STATS_STORE
    pub store_backend: StoreBackend,
    /// COUCHDB_URL
    pub couchdb_url: String,
    /// COUCHDB_USER
    pub couchdb_user: Option<String>,
    /// COUCHDB_PASSWORD
    pub couchdb_password: Option<String>,
    /// COUCHDB_TIMEOUT_SECS
    pub couchdb_timeout_secs: u64,
    /// DATABASE_URL, SQLite file used when STATS_STORE=sqlite
    pub database_url: String,
    /// LOG_FILE; console only when unset
    pub log_file: Option<String>,
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.trim().is_empty())
}

impl StatsConfig {
    /// Load from environment variables.
    pub fn load() -> Result<Self> {
        let store_backend = non_empty_var("STATS_STORE")
            .map(|s| s.parse())
            .transpose()?
            .unwrap_or(StoreBackend::CouchDb);
        let couchdb_url =
            non_empty_var("COUCHDB_URL").unwrap_or_else(|| "http://localhost:5984".to_string());
        let couchdb_timeout_secs = match non_empty_var("COUCHDB_TIMEOUT_SECS") {
            Some(s) => s
                .parse()
                .with_context(|| format!("COUCHDB_TIMEOUT_SECS is not a number: {}", s))?,
            None => 30,
        };
        let database_url = non_empty_var("DATABASE_URL").unwrap_or_else(|| "./stats.db".to_string());

        Ok(Self {
            store_backend,
            couchdb_url,
            couchdb_user: non_empty_var("COUCHDB_USER"),
            couchdb_password: non_empty_var("COUCHDB_PASSWORD"),
            couchdb_timeout_secs,
            database_url,
            log_file: non_empty_var("LOG_FILE"),
        })
    }

    /// Validate config (CouchDB URL must parse; user and password come together).
    pub fn validate(&self) -> Result<()> {
        if self.store_backend == StoreBackend::CouchDb {
            if reqwest::Url::parse(&self.couchdb_url).is_err() {
                anyhow::bail!("COUCHDB_URL is not a valid URL: {}", self.couchdb_url);
            }
            if self.couchdb_user.is_some() != self.couchdb_password.is_some() {
                anyhow::bail!("COUCHDB_USER and COUCHDB_PASSWORD must be set together");
            }
        }
        if self.couchdb_timeout_secs == 0 {
            anyhow::bail!("COUCHDB_TIMEOUT_SECS must be greater than 0");
        }
        Ok(())
    }

    /// Connects the configured backend.
    pub async fn build_store(&self) -> Result<Arc<dyn DocumentStore>> {
        let store: Arc<dyn DocumentStore> = match self.store_backend {
            StoreBackend::CouchDb => {
                let mut client = CouchDbClient::with_timeout(
                    &self.couchdb_url,
                    Duration::from_secs(self.couchdb_timeout_secs),
                )?;
                if let (Some(user), Some(password)) = (&self.couchdb_user, &self.couchdb_password) {
                    client = client.with_credentials(user.clone(), password.clone());
                }
                Arc::new(client)
            }
            StoreBackend::Sqlite => Arc::new(
                DocumentRepository::new(&self.database_url)
                    .await
                    .with_context(|| format!("Open SQLite stats store at {}", self.database_url))?,
            ),
            StoreBackend::Memory => Arc::new(InMemoryDocumentStore::new()),
        };
        Ok(store)
    }
}
