//! listenstats CLI library: argument parsing, store config and command handlers.

pub mod cli;
pub mod commands;
pub mod config;


pub use cli::{Cli, Commands};
pub use commands::{execute, handle_get};
pub use config::{StatsConfig, StoreBackend};
