//! Integration tests for the feed entry lifecycle: seed, add, look up, edit, remove.
//!
//! Each test creates its own in-memory SQLite database for isolation.

use feedshelf::config::Environment;
use feedshelf::storage::{Database, FeedEntry, NewFeedEntry, SeedEntry, SeedError, StorageError};
use pretty_assertions::assert_eq;

async fn test_db() -> Database {
    Database::open(":memory:").await.unwrap()
}

async fn add(db: &Database, title: &str, url: &str) -> FeedEntry {
    db.create_entry(&NewFeedEntry::new(title, url)).await.unwrap();
    db.get_entry_by_title(title).await.unwrap().unwrap()
}

// ============================================================================
// Seeding
// ============================================================================

#[tokio::test]
async fn test_development_seed_then_lookup_by_route() {
    let db = test_db().await;

    let inserted = db.seed_if_empty(&[], Environment::Development).await.unwrap();
    assert_eq!(inserted, 4);

    let titles: Vec<String> = db
        .get_all_entries()
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.title)
        .collect();
    assert_eq!(
        titles,
        vec![
            "Dev Blogs .Net Feed",
            "NCEI NOAA Feed",
            "Aspireify Feed",
            "Test Broken Feed",
        ]
    );

    // Seeded routes are stored as given, not derived from the title
    let broken = db.get_entry_by_route("ErrorFeed").await.unwrap().unwrap();
    assert_eq!(broken.title, "Test Broken Feed");
    assert_eq!(broken.web_address, "https://localhost:8080/broken");
    assert!(db
        .get_entry_by_route("/displayfeed/Test Broken Feed")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_seed_skipped_when_entries_exist() {
    let db = test_db().await;
    add(&db, "Existing", "https://existing.example.com/rss").await;

    let inserted = db.seed_if_empty(&[], Environment::Staging).await.unwrap();
    assert_eq!(inserted, 0);
    assert_eq!(db.count_entries().await.unwrap(), 1);
}

#[tokio::test]
async fn test_production_never_seeds() {
    let db = test_db().await;
    let inserted = db.seed_if_empty(&[], Environment::Production).await.unwrap();
    assert_eq!(inserted, 0);
    assert!(db.get_all_entries().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_incomplete_configured_seed_writes_nothing() {
    let db = test_db().await;
    let seeds = vec![
        SeedEntry {
            title: "Complete".to_string(),
            web_address: "https://complete.example.com".to_string(),
            route_name: "Complete".to_string(),
            open_in_new_tab: false,
        },
        SeedEntry {
            title: "No Route".to_string(),
            web_address: "https://noroute.example.com".to_string(),
            route_name: String::new(),
            open_in_new_tab: false,
        },
    ];

    let err = db
        .seed_if_empty(&seeds, Environment::Development)
        .await
        .unwrap_err();
    assert!(matches!(err, SeedError::InvalidSeedEntry { index: 1 }));
    assert_eq!(db.count_entries().await.unwrap(), 0);
}

// ============================================================================
// Create / read / update / remove
// ============================================================================

#[tokio::test]
async fn test_rename_moves_route_and_frees_old_title() {
    let db = test_db().await;
    let existing = add(&db, "Old Name", "https://feed.example.com/rss").await;
    assert_eq!(existing.route_name, "/displayfeed/Old Name");

    let updated = FeedEntry::draft("New Name", "", true);
    assert_eq!(db.update_entry(&existing, &updated).await.unwrap(), 1);

    assert!(db.get_entry_by_title("Old Name").await.unwrap().is_none());
    let renamed = db
        .get_entry_by_route("/displayfeed/New Name")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(renamed.id, existing.id);
    assert_eq!(renamed.web_address, "https://feed.example.com/rss");
    assert!(renamed.open_in_new_tab);

    // The old title can be reused once the rename is committed
    add(&db, "Old Name", "https://other.example.com/rss").await;
    assert_eq!(db.count_entries().await.unwrap(), 2);
}

#[tokio::test]
async fn test_rename_onto_taken_title_is_refused() {
    let db = test_db().await;
    let first = add(&db, "First", "https://first.example.com").await;
    add(&db, "Second", "https://second.example.com").await;

    let err = db
        .update_entry(&first, &FeedEntry::draft("Second", "", false))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::DuplicateTitle(ref t) if t == "Second"));

    let unchanged = db.get_entry_by_title("First").await.unwrap().unwrap();
    assert_eq!(unchanged, first);
}

#[tokio::test]
async fn test_update_with_stale_snapshot_uses_title_only() {
    let db = test_db().await;
    let snapshot = add(&db, "Snapshot", "https://one.example.com").await;

    db.update_entry(&snapshot, &FeedEntry::draft("", "https://two.example.com", false))
        .await
        .unwrap();

    // The snapshot's other fields are stale but the lookup is by title
    db.update_entry(&snapshot, &FeedEntry::draft("", "https://three.example.com", false))
        .await
        .unwrap();

    let stored = db.get_entry_by_title("Snapshot").await.unwrap().unwrap();
    assert_eq!(stored.web_address, "https://three.example.com");
}

#[tokio::test]
async fn test_remove_then_lookups_miss() {
    let db = test_db().await;
    let entry = add(&db, "Short Lived", "https://brief.example.com").await;

    assert_eq!(db.remove_entry("Short Lived").await.unwrap(), 1);
    assert_eq!(db.remove_entry("Short Lived").await.unwrap(), 0);

    assert!(db.get_entry_by_title("Short Lived").await.unwrap().is_none());
    assert!(db
        .get_entry_by_route(&entry.route_name)
        .await
        .unwrap()
        .is_none());
    assert_eq!(
        db.update_entry(&entry, &FeedEntry::draft("Back", "", false))
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn test_entries_survive_reopen() {
    let dir = std::env::temp_dir().join(format!("feedshelf_reopen_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("feeds.db");
    let _ = std::fs::remove_file(&path);
    let path_str = path.to_str().unwrap();

    {
        let db = Database::open(path_str).await.unwrap();
        db.create_entry(&NewFeedEntry::new("Durable", "https://durable.example.com").with_route("Durable"))
            .await
            .unwrap();
    }

    let db = Database::open(path_str).await.unwrap();
    let entry = db.get_entry_by_route("Durable").await.unwrap().unwrap();
    assert_eq!(entry.title, "Durable");

    let _ = std::fs::remove_dir_all(&dir);
}
