use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::WriteError;

/// Sitewide statistics are stored as the statistics of this pseudo user.
pub const SITEWIDE_STATS_USER_ID: i64 = 15753;

/// Keys the writer owns; payload fields with these names are dropped.
const RESERVED_KEYS: [&str; 5] = ["_id", "user_id", "from_ts", "to_ts", "last_updated"];

/// Whose statistics a document holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    User(i64),
    /// Aggregate over all users.
    Sitewide,
}

impl Scope {
    /// The user id the document is stored under.
    pub fn user_id(&self) -> i64 {
        match self {
            Scope::User(id) => *id,
            Scope::Sitewide => SITEWIDE_STATS_USER_ID,
        }
    }

    /// Document key in the store.
    pub fn key(&self) -> String {
        self.user_id().to_string()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::User(id) => write!(f, "user {}", id),
            Scope::Sitewide => write!(f, "sitewide"),
        }
    }
}

/// Time window a statistic covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatRange {
    ThisWeek,
    ThisMonth,
    ThisYear,
    Week,
    Month,
    Quarter,
    HalfYearly,
    Year,
    AllTime,
}

impl StatRange {
    pub const ALL: [StatRange; 9] = [
        StatRange::ThisWeek,
        StatRange::ThisMonth,
        StatRange::ThisYear,
        StatRange::Week,
        StatRange::Month,
        StatRange::Quarter,
        StatRange::HalfYearly,
        StatRange::Year,
        StatRange::AllTime,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatRange::ThisWeek => "this_week",
            StatRange::ThisMonth => "this_month",
            StatRange::ThisYear => "this_year",
            StatRange::Week => "week",
            StatRange::Month => "month",
            StatRange::Quarter => "quarter",
            StatRange::HalfYearly => "half_yearly",
            StatRange::Year => "year",
            StatRange::AllTime => "all_time",
        }
    }
}

impl fmt::Display for StatRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StatRange::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| format!("unknown stats range: {}", s))
    }
}

/// Category of statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatType {
    Artists,
    Releases,
    ReleaseGroups,
    Recordings,
    ListeningActivity,
    DailyActivity,
    ArtistMap,
}

impl StatType {
    pub const ALL: [StatType; 7] = [
        StatType::Artists,
        StatType::Releases,
        StatType::ReleaseGroups,
        StatType::Recordings,
        StatType::ListeningActivity,
        StatType::DailyActivity,
        StatType::ArtistMap,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatType::Artists => "artists",
            StatType::Releases => "releases",
            StatType::ReleaseGroups => "release_groups",
            StatType::Recordings => "recordings",
            StatType::ListeningActivity => "listening_activity",
            StatType::DailyActivity => "daily_activity",
            StatType::ArtistMap => "artist_map",
        }
    }
}

impl fmt::Display for StatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StatType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown stats type: {}", s))
    }
}

/// Name of the database a stats run writes into: `{stat_type}_{range}_{YYYYMMDD}`.
pub fn stats_database_name(stat_type: &str, range: &str, date: NaiveDate) -> String {
    format!("{}_{}_{}", stat_type, range, date.format("%Y%m%d"))
}

/// One user's statistic as produced by a stats job: the user id plus arbitrary fields
/// (usually `data` and `count`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatPayload {
    pub user_id: i64,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl StatPayload {
    pub fn new(user_id: i64, fields: Map<String, Value>) -> Self {
        Self { user_id, fields }
    }
}

/// A statistics document as persisted in the store.
///
/// Serialized with the store key as `_id`. Payload fields other than `count` and `data` are kept
/// in `extra` and flattened back on write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: i64,
    pub from_ts: i64,
    pub to_ts: i64,
    pub last_updated: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StatDocument {
    /// Builds the document for `user_id` from a payload's fields. The payload is consumed;
    /// identity, time bounds and the freshness stamp always come from the arguments.
    pub fn from_fields(
        user_id: i64,
        mut fields: Map<String, Value>,
        from_ts: i64,
        to_ts: i64,
        last_updated: DateTime<Utc>,
    ) -> Result<Self, WriteError> {
        for key in RESERVED_KEYS {
            fields.remove(key);
        }

        let count = match fields.remove("count") {
            None | Some(Value::Null) => None,
            Some(Value::Number(n)) => Some(n.as_i64().ok_or_else(|| {
                WriteError::Payload(format!("count for user {} is not an integer: {}", user_id, n))
            })?),
            Some(other) => {
                return Err(WriteError::Payload(format!(
                    "count for user {} is not an integer: {}",
                    user_id, other
                )))
            }
        };
        let data = fields.remove("data");

        Ok(Self {
            id: user_id.to_string(),
            user_id,
            from_ts,
            to_ts,
            last_updated: last_updated.to_rfc3339(),
            count,
            data,
            extra: fields,
        })
    }
}

/// A statistic read back from the store, with `data` validated as `T`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatApi<T> {
    pub user_id: i64,
    pub stats_range: String,
    pub from_ts: i64,
    pub to_ts: i64,
    pub count: Option<i64>,
    pub data: T,
    pub last_updated: DateTime<Utc>,
}

/// Parses a stored `last_updated` value: RFC 3339, a naive ISO-8601 timestamp (taken as UTC),
/// or integer epoch seconds.
pub fn parse_last_updated(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            }),
        Value::Number(n) => n.as_i64().and_then(|ts| DateTime::from_timestamp(ts, 0)),
        _ => None,
    }
}
