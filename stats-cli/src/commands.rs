//! Command handlers. Each returns the text `main` prints.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use stats::models::{
    ArtistRecord, DailyActivityRecord, ListeningActivityRecord, RecordingRecord,
    ReleaseGroupRecord, ReleaseRecord, UserArtistMapRecord,
};
use stats::{StatsReader, StatsWriter};
use stats_core::{
    stats_database_name, DocumentStore, Scope, StatApi, StatPayload, StatRange, StatType,
};
use tracing::info;

use crate::cli::Commands;

pub async fn execute(command: Commands, store: Arc<dyn DocumentStore>) -> Result<String> {
    match command {
        Commands::Insert {
            file,
            stat_type,
            range,
            from,
            to,
            database,
            sitewide,
        } => {
            let database = database.unwrap_or_else(|| {
                stats_database_name(stat_type.as_str(), range.as_str(), Utc::now().date_naive())
            });
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("Read stats file {}", file.display()))?;
            handle_insert(store, &database, from, to, &raw, sitewide).await
        }
        Commands::Get {
            stat_type,
            range,
            user,
            sitewide,
        } => {
            let scope = match (user, sitewide) {
                (Some(user_id), false) => Scope::User(user_id),
                (None, true) => Scope::Sitewide,
                (Some(_), true) => anyhow::bail!("--user and --sitewide are mutually exclusive"),
                (None, false) => anyhow::bail!("either --user or --sitewide is required"),
            };
            let reader = StatsReader::new(store);
            Ok(handle_get(&reader, scope, stat_type, range)
                .await?
                .unwrap_or_else(|| format!("no {} {} stats available for {}", stat_type, range, scope)))
        }
        Commands::ListDatabases { prefix } => {
            let databases = store.list_databases(&prefix).await?;
            if databases.is_empty() {
                return Ok("no databases".to_string());
            }
            Ok(databases.join("\n"))
        }
        Commands::DropDatabase { name } => {
            if store.delete_database(&name).await? {
                Ok(format!("dropped {}", name))
            } else {
                Ok(format!("{} does not exist", name))
            }
        }
    }
}

async fn handle_insert(
    store: Arc<dyn DocumentStore>,
    database: &str,
    from_ts: i64,
    to_ts: i64,
    raw: &str,
    sitewide: bool,
) -> Result<String> {
    let writer = StatsWriter::new(store);
    if sitewide {
        let fields: Map<String, Value> =
            serde_json::from_str(raw).context("Sitewide stats file must hold one JSON object")?;
        writer
            .insert_sitewide_stats(database, from_ts, to_ts, fields)
            .await?;
        info!(database = %database, "Inserted sitewide stats");
        return Ok(format!("inserted sitewide stats into {}", database));
    }

    let payloads: Vec<StatPayload> = serde_json::from_str(raw)
        .context("Stats file must hold a JSON array of objects with a user_id")?;
    let count = payloads.len();
    writer.insert_stats(database, from_ts, to_ts, payloads).await?;
    info!(database = %database, count = count, "Inserted user stats");
    Ok(format!("inserted {} user stats into {}", count, database))
}

/// Reads the newest stats with the record schema that belongs to `stat_type`.
pub async fn handle_get(
    reader: &StatsReader,
    scope: Scope,
    stat_type: StatType,
    range: StatRange,
) -> Result<Option<String>> {
    let (t, r) = (stat_type.as_str(), range.as_str());
    match stat_type {
        StatType::Artists => pretty(reader.get_entity_stats::<Vec<ArtistRecord>>(scope, t, r).await),
        StatType::Releases => pretty(reader.get_entity_stats::<Vec<ReleaseRecord>>(scope, t, r).await),
        StatType::ReleaseGroups => {
            pretty(reader.get_entity_stats::<Vec<ReleaseGroupRecord>>(scope, t, r).await)
        }
        StatType::Recordings => {
            pretty(reader.get_entity_stats::<Vec<RecordingRecord>>(scope, t, r).await)
        }
        StatType::ListeningActivity => {
            pretty(reader.get_entity_stats::<Vec<ListeningActivityRecord>>(scope, t, r).await)
        }
        StatType::DailyActivity => {
            pretty(reader.get_entity_stats::<Vec<DailyActivityRecord>>(scope, t, r).await)
        }
        StatType::ArtistMap => {
            pretty(reader.get_entity_stats::<Vec<UserArtistMapRecord>>(scope, t, r).await)
        }
    }
}

fn pretty<T: Serialize>(stat: Option<StatApi<T>>) -> Result<Option<String>> {
    Ok(stat.map(|s| serde_json::to_string_pretty(&s)).transpose()?)
}
