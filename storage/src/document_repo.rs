//! Document repository: statistics documents persisted in SQLite.
//!
//! Uses SqlitePoolManager. Each document is stored as JSON text keyed by `(database, id)`;
//! databases are tracked in their own table so empty ones can be listed and dropped.
//! External: SQLite via sqlx; callers use the [`DocumentStore`] trait.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::Row;
use stats_core::{
    database_matches_prefix, sort_newest_first, DocumentStore, StatDocument, StoreError,
};
use tracing::{debug, info};

use crate::sqlite_pool::SqlitePoolManager;

fn db_err(e: sqlx::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

#[derive(Clone)]
pub struct DocumentRepository {
    pool_manager: SqlitePoolManager,
}

impl DocumentRepository {
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool_manager = SqlitePoolManager::new(database_url).await?;
        let repo = Self { pool_manager };
        repo.init().await?;
        Ok(repo)
    }

    async fn init(&self) -> Result<(), sqlx::Error> {
        info!("Creating stats tables if not exist");

        let pool = self.pool_manager.pool();

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS stat_databases (
                name TEXT PRIMARY KEY,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS stat_documents (
                db_name TEXT NOT NULL,
                id TEXT NOT NULL,
                document TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (db_name, id)
            )
            "#,
        )
        .execute(pool)
        .await?;

        info!("Stats tables created successfully");
        Ok(())
    }

    /// Number of documents stored in `database`.
    pub async fn count_documents(&self, database: &str) -> Result<i64, StoreError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM stat_documents WHERE db_name = ?")
            .bind(database)
            .fetch_one(self.pool_manager.pool())
            .await
            .map_err(db_err)?;
        Ok(count.0)
    }
}

#[async_trait]
impl DocumentStore for DocumentRepository {
    async fn insert_data(&self, database: &str, docs: &[StatDocument]) -> Result<(), StoreError> {
        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool_manager.pool().begin().await.map_err(db_err)?;

        sqlx::query("INSERT OR IGNORE INTO stat_databases (name, created_at) VALUES (?, ?)")
            .bind(database)
            .bind(&now)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        for doc in docs {
            let body = serde_json::to_string(doc)?;
            sqlx::query(
                r#"
                INSERT INTO stat_documents (db_name, id, document, updated_at)
                VALUES (?, ?, ?, ?)
                ON CONFLICT (db_name, id) DO UPDATE SET
                    document = excluded.document,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(database)
            .bind(&doc.id)
            .bind(body)
            .bind(&now)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)?;

        info!(database = %database, count = docs.len(), "Upserted stats documents");
        Ok(())
    }

    async fn fetch_data(&self, prefix: &str, key: &str) -> Result<Option<Value>, StoreError> {
        let Some(database) = self.list_databases(prefix).await?.into_iter().next() else {
            debug!(prefix = %prefix, "No database matches prefix");
            return Ok(None);
        };

        let row = sqlx::query("SELECT document FROM stat_documents WHERE db_name = ? AND id = ?")
            .bind(&database)
            .bind(key)
            .fetch_optional(self.pool_manager.pool())
            .await
            .map_err(db_err)?;

        match row {
            Some(row) => {
                let body: String = row.try_get("document").map_err(db_err)?;
                debug!(database = %database, key = %key, "Fetched stats document");
                Ok(Some(serde_json::from_str(&body)?))
            }
            None => Ok(None),
        }
    }

    async fn list_databases(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let names: Vec<(String,)> = sqlx::query_as("SELECT name FROM stat_databases")
            .fetch_all(self.pool_manager.pool())
            .await
            .map_err(db_err)?;

        let mut matching: Vec<String> = names
            .into_iter()
            .map(|(name,)| name)
            .filter(|name| database_matches_prefix(name, prefix))
            .collect();
        sort_newest_first(&mut matching);
        Ok(matching)
    }

    async fn create_database(&self, database: &str) -> Result<(), StoreError> {
        sqlx::query("INSERT OR IGNORE INTO stat_databases (name, created_at) VALUES (?, ?)")
            .bind(database)
            .bind(Utc::now().to_rfc3339())
            .execute(self.pool_manager.pool())
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn delete_database(&self, database: &str) -> Result<bool, StoreError> {
        let mut tx = self.pool_manager.pool().begin().await.map_err(db_err)?;

        let removed_docs = sqlx::query("DELETE FROM stat_documents WHERE db_name = ?")
            .bind(database)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        let removed = sqlx::query("DELETE FROM stat_databases WHERE name = ?")
            .bind(database)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;

        info!(
            database = %database,
            documents = removed_docs.rows_affected(),
            "Dropped stats database"
        );
        Ok(removed.rows_affected() > 0)
    }
}
