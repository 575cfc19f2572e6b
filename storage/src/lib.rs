//! Storage crate: SQLite persistence for statistics documents.
//!
//! ## Modules
//!
//! - [`document_repo`] – DocumentRepository, a [`stats_core::DocumentStore`] on SQLite
//! - [`sqlite_pool`] – SqlitePoolManager

mod document_repo;
mod sqlite_pool;


pub use document_repo::DocumentRepository;
pub use sqlite_pool::SqlitePoolManager;
