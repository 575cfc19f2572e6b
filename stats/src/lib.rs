//! # stats
//!
//! Inserts statistics computed by the stats jobs into a [`DocumentStore`](stats_core::DocumentStore)
//! and retrieves them as typed records.
//!
//! ## Modules
//!
//! - [`writer`] – StatsWriter: per-user and sitewide inserts
//! - [`reader`] – StatsReader: typed lookups that degrade to `None` on failure
//! - [`models`] – record schemas the `data` payload is validated against

pub mod models;
pub mod reader;
pub mod writer;

#[cfg(test)]
mod writer_test;

pub use reader::StatsReader;
pub use writer::StatsWriter;
