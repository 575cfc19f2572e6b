//! Record schemas for the `data` payload of each stat type.
//!
//! A read is only successful if `data` deserializes into the requested schema; unknown fields
//! are ignored, missing or mistyped ones fail validation.

mod artist_map;
mod daily_activity;
mod entity;
mod listening_activity;

pub use artist_map::{UserArtistMapArtist, UserArtistMapRecord};
pub use daily_activity::{DailyActivityRecord, Hour, Weekday};
pub use entity::{ArtistRecord, RecordingRecord, ReleaseGroupRecord, ReleaseRecord};
pub use listening_activity::ListeningActivityRecord;
