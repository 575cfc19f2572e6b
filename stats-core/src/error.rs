//! Error types shared by the store backends, the writer and the reader.

use thiserror::Error;

/// Errors raised by a [`DocumentStore`](crate::DocumentStore) backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store answered with a non-success HTTP status.
    #[error("HTTP error ({status}): {body}")]
    Http { status: u16, body: String },

    /// The store could not be reached (connection refused, timeout, ...).
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Some documents of a bulk write were rejected by the store.
    #[error("Bulk write to {database} rejected {} document(s): {}", failures.len(), failures.join(", "))]
    BulkConflict {
        database: String,
        failures: Vec<String>,
    },
}

impl StoreError {
    /// Response body of a failed HTTP exchange, when the store returned one.
    pub fn response_body(&self) -> Option<&str> {
        match self {
            StoreError::Http { body, .. } if !body.is_empty() => Some(body),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Why a stored document could not be turned into a typed record.
#[derive(Error, Debug)]
pub enum ReadError {
    #[error("Store error: {0}")]
    Transport(#[from] StoreError),

    #[error("Missing key in stats document: {0}")]
    MissingKey(&'static str),

    #[error("Stats document failed validation: {0}")]
    Validation(String),
}

impl ReadError {
    pub fn is_transport(&self) -> bool {
        matches!(self, ReadError::Transport(_))
    }
}

/// Failures of the write path. These always reach the caller.
#[derive(Error, Debug)]
pub enum WriteError {
    /// A per-user write tried to use the id reserved for sitewide stats.
    #[error("User id {0} is reserved for sitewide stats")]
    ReservedUserId(i64),

    #[error("Invalid stats payload: {0}")]
    Payload(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
