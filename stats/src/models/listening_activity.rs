use serde::{Deserialize, Serialize};

/// Listens in one sub-period of the stats range, e.g. one day of a week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListeningActivityRecord {
    pub from_ts: i64,
    pub to_ts: i64,
    /// Human readable label of the sub-period ("Monday 01 January 2024", "January 2024", ...).
    pub time_range: String,
    pub listen_count: i64,
}
