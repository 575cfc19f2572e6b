//! # stats-core
//!
//! Core types and traits for listening statistics persistence: [`StatDocument`], [`StatApi`],
//! [`Scope`], the [`DocumentStore`] trait implemented by the storage backends, error types,
//! the injectable [`Clock`] and tracing initialization. Backend-agnostic; used by `stats`,
//! `storage`, `store-inmemory` and `couchdb-client`.

pub mod clock;
pub mod error;
pub mod logger;
pub mod store;
pub mod types;


pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ReadError, StoreError, WriteError};
pub use logger::init_tracing;
pub use store::{database_matches_prefix, sort_newest_first, DocumentStore};
pub use types::{
    parse_last_updated, stats_database_name, Scope, StatApi, StatDocument, StatPayload, StatRange,
    StatType, SITEWIDE_STATS_USER_ID,
};
