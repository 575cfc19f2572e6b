//! Top-entity records (`artists`, `releases`, `release_groups`, `recordings` stats).
//!
//! The `data` of these stats is a list of records ordered by listen count.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistRecord {
    pub artist_name: String,
    #[serde(default)]
    pub artist_mbid: Option<Uuid>,
    pub listen_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseRecord {
    pub release_name: String,
    #[serde(default)]
    pub release_mbid: Option<Uuid>,
    pub artist_name: String,
    #[serde(default)]
    pub artist_mbids: Vec<Uuid>,
    #[serde(default)]
    pub caa_id: Option<i64>,
    #[serde(default)]
    pub caa_release_mbid: Option<Uuid>,
    pub listen_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseGroupRecord {
    pub release_group_name: String,
    #[serde(default)]
    pub release_group_mbid: Option<Uuid>,
    pub artist_name: String,
    #[serde(default)]
    pub artist_mbids: Vec<Uuid>,
    #[serde(default)]
    pub caa_id: Option<i64>,
    #[serde(default)]
    pub caa_release_mbid: Option<Uuid>,
    pub listen_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingRecord {
    pub track_name: String,
    #[serde(default)]
    pub recording_mbid: Option<Uuid>,
    #[serde(default)]
    pub release_name: Option<String>,
    #[serde(default)]
    pub release_mbid: Option<Uuid>,
    pub artist_name: String,
    #[serde(default)]
    pub artist_mbids: Vec<Uuid>,
    pub listen_count: i64,
}
