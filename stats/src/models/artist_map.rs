use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An artist listed under a country of the artist map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserArtistMapArtist {
    pub artist_name: String,
    pub artist_mbid: Uuid,
    pub listen_count: i64,
}

/// Listens grouped by the country of the artists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserArtistMapRecord {
    /// ISO 3166-1 alpha-3 country code.
    pub country: String,
    pub artist_count: i64,
    #[serde(default)]
    pub listen_count: Option<i64>,
    #[serde(default)]
    pub artists: Vec<UserArtistMapArtist>,
}
