//! Integration tests for the listenstats command handlers on the in-memory and SQLite stores.

use std::io::Write;
use std::sync::Arc;

use stats::StatsReader;
use stats_cli::{execute, handle_get, Commands};
use stats_core::{DocumentStore, Scope, StatRange, StatType};
use storage::DocumentRepository;
use store_inmemory::InMemoryDocumentStore;
use tempfile::{NamedTempFile, TempDir};

fn stats_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("NamedTempFile::new must succeed");
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn insert(file: &NamedTempFile, database: Option<&str>, sitewide: bool) -> Commands {
    Commands::Insert {
        file: file.path().to_path_buf(),
        stat_type: StatType::Artists,
        range: StatRange::Week,
        from: 100,
        to: 200,
        database: database.map(str::to_string),
        sitewide,
    }
}

/// **Test: Inserted user stats come back through `get` as pretty JSON.**
///
/// **Setup:** In-memory store; file with top artists for users 1 and 2.
/// **Action:** `insert` into `artists_week_20240108`, then `get --type artists --range week --user 2`.
/// **Expected:** Insert reports 2 users; get prints user 2's record.
#[tokio::test]
async fn test_insert_then_get_user_stats() {
    let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
    let file = stats_file(
        r#"[
            {"user_id": 1, "count": 1, "data": [{"artist_name": "Portishead", "listen_count": 5}]},
            {"user_id": 2, "count": 1, "data": [{"artist_name": "Tricky", "listen_count": 9}]}
        ]"#,
    );

    let output = execute(insert(&file, Some("artists_week_20240108"), false), store.clone())
        .await
        .unwrap();
    assert_eq!(output, "inserted 2 user stats into artists_week_20240108");

    let output = execute(
        Commands::Get {
            stat_type: StatType::Artists,
            range: StatRange::Week,
            user: Some(2),
            sitewide: false,
        },
        store,
    )
    .await
    .unwrap();
    assert!(output.contains("\"Tricky\""));
    assert!(output.contains("\"stats_range\": \"week\""));
    assert!(!output.contains("Portishead"));
}

/// **Test: Without --database the run lands in today's {type}_{range}_{date} database.**
#[tokio::test]
async fn test_insert_defaults_to_dated_database() {
    let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
    let file = stats_file(r#"[{"user_id": 1, "data": []}]"#);

    execute(insert(&file, None, false), store.clone()).await.unwrap();

    let output = execute(
        Commands::ListDatabases {
            prefix: "artists_week".to_string(),
        },
        store,
    )
    .await
    .unwrap();
    let today = chrono::Utc::now().date_naive().format("%Y%m%d").to_string();
    assert_eq!(output, format!("artists_week_{}", today));
}

/// **Test: Sitewide insert reads one object and is visible only through the sitewide scope.**
#[tokio::test]
async fn test_sitewide_insert_and_get() {
    let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
    let file = stats_file(r#"{"data": [{"artist_name": "Massive Attack", "listen_count": 1200}]}"#);

    let output = execute(insert(&file, Some("artists_week_20240108"), true), store.clone())
        .await
        .unwrap();
    assert_eq!(output, "inserted sitewide stats into artists_week_20240108");

    let reader = StatsReader::new(store);
    let sitewide = handle_get(&reader, Scope::Sitewide, StatType::Artists, StatRange::Week)
        .await
        .unwrap()
        .expect("sitewide stats should be found");
    assert!(sitewide.contains("\"user_id\": 15753"));

    let user = handle_get(&reader, Scope::User(1), StatType::Artists, StatRange::Week)
        .await
        .unwrap();
    assert!(user.is_none());
}

/// **Test: Missing stats print a notice instead of failing.**
#[tokio::test]
async fn test_get_missing_stats_prints_notice() {
    let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());

    let output = execute(
        Commands::Get {
            stat_type: StatType::DailyActivity,
            range: StatRange::AllTime,
            user: None,
            sitewide: true,
        },
        store,
    )
    .await
    .unwrap();
    assert_eq!(output, "no daily_activity all_time stats available for sitewide");
}

/// **Test: A user file that is not an array of payloads is rejected before any write.**
#[tokio::test]
async fn test_insert_rejects_malformed_file() {
    let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
    let file = stats_file(r#"{"user_id": 1}"#);

    assert!(execute(insert(&file, Some("artists_week_1"), false), store.clone())
        .await
        .is_err());
    assert!(store.list_databases("").await.unwrap().is_empty());
}

/// **Test: The reserved sitewide id cannot be written as a user.**
#[tokio::test]
async fn test_insert_rejects_reserved_user_id() {
    let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
    let file = stats_file(r#"[{"user_id": 15753, "data": []}]"#);

    let err = execute(insert(&file, Some("artists_week_1"), false), store)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("15753"));
}

/// **Test: Databases are listed and dropped on the SQLite store.**
#[tokio::test]
async fn test_list_and_drop_databases_sqlite() {
    let dir = TempDir::new().expect("TempDir::new must succeed");
    let path = dir.path().join("stats.db");
    let store: Arc<dyn DocumentStore> = Arc::new(
        DocumentRepository::new(path.to_str().unwrap())
            .await
            .expect("Failed to create repository"),
    );
    let file = stats_file(r#"[{"user_id": 1, "data": []}]"#);
    execute(insert(&file, Some("artists_week_20240101"), false), store.clone())
        .await
        .unwrap();
    execute(insert(&file, Some("artists_week_20240108"), false), store.clone())
        .await
        .unwrap();

    let listed = execute(
        Commands::ListDatabases {
            prefix: "artists".to_string(),
        },
        store.clone(),
    )
    .await
    .unwrap();
    assert!(listed.contains("artists_week_20240101"));
    assert!(listed.contains("artists_week_20240108"));

    let dropped = execute(
        Commands::DropDatabase {
            name: "artists_week_20240101".to_string(),
        },
        store.clone(),
    )
    .await
    .unwrap();
    assert_eq!(dropped, "dropped artists_week_20240101");

    let again = execute(
        Commands::DropDatabase {
            name: "artists_week_20240101".to_string(),
        },
        store,
    )
    .await
    .unwrap();
    assert_eq!(again, "artists_week_20240101 does not exist");
}

/// **Test: `get` needs exactly one of a user or the sitewide scope.**
///
/// **Setup:** In-memory store.
/// **Action:** `execute(Get)` with neither `user` nor `sitewide`, then with both.
/// **Expected:** Both calls fail instead of falling back to a scope.
#[tokio::test]
async fn test_get_requires_exactly_one_scope() {
    let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());

    let err = execute(
        Commands::Get {
            stat_type: StatType::Artists,
            range: StatRange::Week,
            user: None,
            sitewide: false,
        },
        store.clone(),
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("--user or --sitewide"));

    let err = execute(
        Commands::Get {
            stat_type: StatType::Artists,
            range: StatRange::Week,
            user: Some(1),
            sitewide: true,
        },
        store,
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("mutually exclusive"));
}
