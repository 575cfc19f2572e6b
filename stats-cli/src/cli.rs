//! CLI parser.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use stats_core::{StatRange, StatType};

#[derive(Parser)]
#[command(name = "listenstats")]
#[command(about = "Listen stats CLI: insert, get, list-databases, drop-database", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a stats run from a JSON file (array of per-user payloads, or one object with --sitewide).
    Insert {
        #[arg(short, long)]
        file: PathBuf,
        #[arg(long = "type")]
        stat_type: StatType,
        #[arg(long)]
        range: StatRange,
        #[arg(long)]
        from: i64,
        #[arg(long)]
        to: i64,
        /// Target database; defaults to {type}_{range}_{today}.
        #[arg(long)]
        database: Option<String>,
        #[arg(long)]
        sitewide: bool,
    },
    /// Print the newest stats for a user or for the whole site.
    Get {
        #[arg(long = "type")]
        stat_type: StatType,
        #[arg(long)]
        range: StatRange,
        #[arg(long, conflicts_with = "sitewide", required_unless_present = "sitewide")]
        user: Option<i64>,
        #[arg(long)]
        sitewide: bool,
    },
    /// List stats databases whose name starts with the prefix.
    ListDatabases {
        #[arg(short, long, default_value = "")]
        prefix: String,
    },
    /// Delete a stats database.
    DropDatabase { name: String },
}
