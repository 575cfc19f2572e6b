//! Stats reader: fetches a user's (or the sitewide) statistic and validates it into
//! [`StatApi<T>`].
//!
//! [`StatsReader::get_entity_stats`] never fails: store and validation errors are logged and
//! reported as "no stats". [`StatsReader::try_get_entity_stats`] returns them instead.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use stats_core::{
    parse_last_updated, DocumentStore, ReadError, Scope, StatApi, StoreError,
    SITEWIDE_STATS_USER_ID,
};
use tracing::error;

#[derive(Clone)]
pub struct StatsReader {
    store: Arc<dyn DocumentStore>,
}

impl StatsReader {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Returns the `stats_type` statistic of `scope` for `stats_range`, or `None` if there is
    /// none or it could not be read. Failures are logged. `Scope::User` with the sitewide id is
    /// invalid; sitewide stats are read through [`Scope::Sitewide`].
    pub async fn get_entity_stats<T: DeserializeOwned>(
        &self,
        scope: Scope,
        stats_type: &str,
        stats_range: &str,
    ) -> Option<StatApi<T>> {
        if let Err(e) = check_scope(scope) {
            error!(
                error = %e,
                stats_type = %stats_type,
                stats_range = %stats_range,
                user_id = scope.user_id(),
                "Invalid stats scope"
            );
            return None;
        }

        let document = match self.fetch(scope, stats_type, stats_range).await {
            Ok(Some(document)) => document,
            Ok(None) => return None,
            Err(e) => {
                error!(
                    error = %e,
                    response = e.response_body().unwrap_or("<none>"),
                    stats_type = %stats_type,
                    stats_range = %stats_range,
                    user_id = scope.user_id(),
                    "Failed to fetch stats"
                );
                return None;
            }
        };

        match stat_from_document(&document, scope, stats_range) {
            Ok(stat) => Some(stat),
            Err(e) => {
                error!(
                    error = %e,
                    stats_type = %stats_type,
                    stats_range = %stats_range,
                    user_id = scope.user_id(),
                    data = %serde_json::to_string_pretty(&document).unwrap_or_default(),
                    "Invalid stats document"
                );
                None
            }
        }
    }

    /// Sitewide variant of [`get_entity_stats`](Self::get_entity_stats).
    pub async fn get_sitewide_stats<T: DeserializeOwned>(
        &self,
        stats_type: &str,
        stats_range: &str,
    ) -> Option<StatApi<T>> {
        self.get_entity_stats(Scope::Sitewide, stats_type, stats_range)
            .await
    }

    /// Like [`get_entity_stats`](Self::get_entity_stats) but returns failures instead of
    /// logging them. A missing document is still `Ok(None)`.
    pub async fn try_get_entity_stats<T: DeserializeOwned>(
        &self,
        scope: Scope,
        stats_type: &str,
        stats_range: &str,
    ) -> Result<Option<StatApi<T>>, ReadError> {
        check_scope(scope)?;
        match self.fetch(scope, stats_type, stats_range).await? {
            Some(document) => stat_from_document(&document, scope, stats_range).map(Some),
            None => Ok(None),
        }
    }

    async fn fetch(
        &self,
        scope: Scope,
        stats_type: &str,
        stats_range: &str,
    ) -> Result<Option<Value>, StoreError> {
        let prefix = format!("{}_{}", stats_type, stats_range);
        self.store.fetch_data(&prefix, &scope.key()).await
    }
}

/// The sitewide id is only reachable through [`Scope::Sitewide`].
fn check_scope(scope: Scope) -> Result<(), ReadError> {
    match scope {
        Scope::User(SITEWIDE_STATS_USER_ID) => Err(ReadError::Validation(format!(
            "user id {} is reserved for sitewide stats",
            SITEWIDE_STATS_USER_ID
        ))),
        _ => Ok(()),
    }
}

fn required<'a>(document: &'a Value, key: &'static str) -> Result<&'a Value, ReadError> {
    document.get(key).ok_or(ReadError::MissingKey(key))
}

fn required_i64(document: &Value, key: &'static str) -> Result<i64, ReadError> {
    let value = required(document, key)?;
    value
        .as_i64()
        .ok_or_else(|| ReadError::Validation(format!("{} is not an integer: {}", key, value)))
}

/// Validates a raw document into a typed record.
fn stat_from_document<T: DeserializeOwned>(
    document: &Value,
    scope: Scope,
    stats_range: &str,
) -> Result<StatApi<T>, ReadError> {
    let from_ts = required_i64(document, "from_ts")?;
    let to_ts = required_i64(document, "to_ts")?;

    let raw_last_updated = required(document, "last_updated")?;
    let last_updated = parse_last_updated(raw_last_updated).ok_or_else(|| {
        ReadError::Validation(format!("last_updated is not a timestamp: {}", raw_last_updated))
    })?;

    let count = match document.get("count") {
        None | Some(Value::Null) => None,
        Some(value) => Some(value.as_i64().ok_or_else(|| {
            ReadError::Validation(format!("count is not an integer: {}", value))
        })?),
    };

    let data = T::deserialize(required(document, "data")?)
        .map_err(|e| ReadError::Validation(format!("data: {}", e)))?;

    Ok(StatApi {
        user_id: scope.user_id(),
        stats_range: stats_range.to_string(),
        from_ts,
        to_ts,
        count,
        data,
        last_updated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_document() -> Value {
        json!({
            "_id": "7",
            "user_id": 7,
            "from_ts": 100,
            "to_ts": 200,
            "last_updated": "2024-01-02T03:04:05+00:00",
            "count": 2,
            "data": {"x": 1}
        })
    }

    #[test]
    fn test_stat_from_document() {
        let stat: StatApi<Value> =
            stat_from_document(&valid_document(), Scope::User(7), "week").unwrap();
        assert_eq!(stat.user_id, 7);
        assert_eq!(stat.stats_range, "week");
        assert_eq!(stat.from_ts, 100);
        assert_eq!(stat.to_ts, 200);
        assert_eq!(stat.count, Some(2));
        assert_eq!(stat.data, json!({"x": 1}));
    }

    #[test]
    fn test_stat_from_document_without_count() {
        let mut document = valid_document();
        document.as_object_mut().unwrap().remove("count");
        let stat: StatApi<Value> =
            stat_from_document(&document, Scope::User(7), "week").unwrap();
        assert_eq!(stat.count, None);
    }

    #[test]
    fn test_stat_from_document_missing_keys() {
        for key in ["from_ts", "to_ts", "last_updated", "data"] {
            let mut document = valid_document();
            document.as_object_mut().unwrap().remove(key);
            let err = stat_from_document::<Value>(&document, Scope::User(7), "week").unwrap_err();
            assert!(matches!(err, ReadError::MissingKey(k) if k == key));
        }
    }

    #[test]
    fn test_stat_from_document_rejects_bad_types() {
        let mut document = valid_document();
        document["from_ts"] = json!("yesterday");
        let err = stat_from_document::<Value>(&document, Scope::User(7), "week").unwrap_err();
        assert!(matches!(err, ReadError::Validation(_)));

        let mut document = valid_document();
        document["count"] = json!(1.5);
        let err = stat_from_document::<Value>(&document, Scope::User(7), "week").unwrap_err();
        assert!(matches!(err, ReadError::Validation(_)));
    }

    #[test]
    fn test_stat_from_document_validates_data() {
        let err = stat_from_document::<Vec<u32>>(&valid_document(), Scope::User(7), "week")
            .unwrap_err();
        assert!(matches!(err, ReadError::Validation(_)));
        assert!(!err.is_transport());
    }

    #[test]
    fn test_check_scope_rejects_reserved_user_id() {
        let err = check_scope(Scope::User(SITEWIDE_STATS_USER_ID)).unwrap_err();
        assert!(matches!(err, ReadError::Validation(_)));
        assert!(check_scope(Scope::Sitewide).is_ok());
        assert!(check_scope(Scope::User(7)).is_ok());
    }

    #[test]
    fn test_sitewide_user_id() {
        let stat: StatApi<Value> =
            stat_from_document(&valid_document(), Scope::Sitewide, "all_time").unwrap();
        assert_eq!(stat.user_id, 15753);
    }
}
