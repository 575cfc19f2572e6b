//! Unit tests for StatsWriter.
//!
//! Covers document identity and bounds, the sitewide id, reserved-id rejection and empty batches.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use serde_json::{json, Map, Value};
use stats_core::{DocumentStore, FixedClock, StatPayload, WriteError};
use store_inmemory::InMemoryDocumentStore;

use crate::writer::StatsWriter;

fn payload(user_id: i64, data: Value) -> StatPayload {
    let mut fields = Map::new();
    fields.insert("data".to_string(), data);
    StatPayload::new(user_id, fields)
}

fn writer(store: &InMemoryDocumentStore) -> StatsWriter {
    let clock = FixedClock(Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap());
    StatsWriter::with_clock(Arc::new(store.clone()), Arc::new(clock))
}

#[tokio::test]
async fn test_insert_stats_sets_id_and_bounds() {
    let store = InMemoryDocumentStore::new();
    let writer = writer(&store);

    writer
        .insert_stats(
            "artists_week_20240506",
            100,
            200,
            vec![payload(1, json!(["a"])), payload(2, json!(["b"])), payload(3, json!([]))],
        )
        .await
        .expect("insert should succeed");

    assert_eq!(store.len("artists_week_20240506").await, 3);
    for user_id in 1..=3 {
        let doc = store
            .get("artists_week_20240506", &user_id.to_string())
            .await
            .expect("document should exist");
        assert_eq!(doc["_id"], json!(user_id.to_string()));
        assert_eq!(doc["user_id"], json!(user_id));
        assert_eq!(doc["from_ts"], json!(100));
        assert_eq!(doc["to_ts"], json!(200));
        assert_eq!(doc["last_updated"], json!("2024-05-06T07:08:09+00:00"));
    }
}

#[tokio::test]
async fn test_insert_stats_does_not_trust_payload_bounds() {
    let store = InMemoryDocumentStore::new();
    let writer = writer(&store);

    let mut fields = Map::new();
    fields.insert("from_ts".to_string(), json!(1));
    fields.insert("to_ts".to_string(), json!(2));
    fields.insert("data".to_string(), json!({}));

    writer
        .insert_stats("db", 100, 200, vec![StatPayload::new(5, fields)])
        .await
        .unwrap();

    let doc = store.get("db", "5").await.unwrap();
    assert_eq!(doc["from_ts"], json!(100));
    assert_eq!(doc["to_ts"], json!(200));
}

#[tokio::test]
async fn test_insert_sitewide_stats_uses_reserved_id() {
    let store = InMemoryDocumentStore::new();
    let writer = writer(&store);

    let mut fields = Map::new();
    fields.insert("user_id".to_string(), json!(42));
    fields.insert("data".to_string(), json!([{"artist_name": "Björk", "listen_count": 10}]));

    writer
        .insert_sitewide_stats("artists_all_time_20240506", 0, 200, fields)
        .await
        .unwrap();

    assert_eq!(store.len("artists_all_time_20240506").await, 1);
    let doc = store.get("artists_all_time_20240506", "15753").await.unwrap();
    assert_eq!(doc["user_id"], json!(15753));
    assert_eq!(doc["_id"], json!("15753"));
    assert!(store.get("artists_all_time_20240506", "42").await.is_none());
}

#[tokio::test]
async fn test_insert_stats_rejects_sitewide_id() {
    let store = InMemoryDocumentStore::new();
    let writer = writer(&store);

    let err = writer
        .insert_stats("db", 0, 1, vec![payload(1, json!([])), payload(15753, json!([]))])
        .await
        .unwrap_err();

    assert!(matches!(err, WriteError::ReservedUserId(15753)));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_insert_stats_empty_batch_is_noop() {
    let store = InMemoryDocumentStore::new();
    let writer = writer(&store);

    writer.insert_stats("db", 0, 1, vec![]).await.unwrap();

    assert!(store.list_databases("").await.unwrap().is_empty());
}
