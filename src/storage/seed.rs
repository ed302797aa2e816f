//! Starter data for an empty feed database.
//!
//! Seeding only happens outside production and only into an empty table.
//! A configured seed list replaces the built-in one, but it is all or
//! nothing: one incomplete entry rejects the whole batch.

use serde::Deserialize;
use thiserror::Error;

use super::schema::Database;
use super::types::StorageError;
use crate::config::Environment;
use crate::util::validate_persisted;

#[derive(Debug, Error)]
pub enum SeedError {
    /// A configured seed entry is missing a required field
    #[error("Invalid seed entry #{index}: title, web_address and route_name are all required")]
    InvalidSeedEntry { index: usize },

    #[error("Seeding failed: {0}")]
    Storage(#[from] StorageError),
}

impl From<sqlx::Error> for SeedError {
    fn from(err: sqlx::Error) -> Self {
        SeedError::Storage(err.into())
    }
}

/// One starter feed entry, as written in the `[[seed_feeds]]` config table.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SeedEntry {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub web_address: String,
    #[serde(default)]
    pub route_name: String,
    #[serde(default)]
    pub open_in_new_tab: bool,
}

impl SeedEntry {
    fn new(title: &str, web_address: &str, route_name: &str) -> Self {
        Self {
            title: title.to_string(),
            web_address: web_address.to_string(),
            route_name: route_name.to_string(),
            open_in_new_tab: false,
        }
    }

    fn is_complete(&self) -> bool {
        !self.title.trim().is_empty()
            && !self.web_address.trim().is_empty()
            && !self.route_name.trim().is_empty()
    }
}

/// Entries used when no seed list is configured.
pub fn default_seed_entries() -> Vec<SeedEntry> {
    vec![
        SeedEntry::new(
            "Dev Blogs .Net Feed",
            "https://devblogs.microsoft.com/dotnet/feed/",
            "DevBlogsDotNetFeed",
        ),
        SeedEntry::new(
            "NCEI NOAA Feed",
            "https://www.ncei.noaa.gov/news.xml",
            "NceiNoaaGov",
        ),
        SeedEntry::new("Aspireify Feed", "https://aspireify.net/rss", "Aspireify"),
        SeedEntry::new(
            "Test Broken Feed",
            "https://localhost:8080/broken",
            "ErrorFeed",
        ),
    ]
}

/// Pick the seed batch: the configured list when it is non-empty and every
/// entry is complete, the built-in list when nothing is configured.
pub fn resolve_seed_entries(configured: &[SeedEntry]) -> Result<Vec<SeedEntry>, SeedError> {
    if configured.is_empty() {
        return Ok(default_seed_entries());
    }

    if let Some(index) = configured.iter().position(|e| !e.is_complete()) {
        return Err(SeedError::InvalidSeedEntry { index });
    }

    Ok(configured.to_vec())
}

impl Database {
    /// Insert starter entries into an empty table.
    ///
    /// # Returns
    ///
    /// The number of entries inserted; 0 when running in production or when
    /// the table already has rows.
    ///
    /// # Errors
    ///
    /// [`SeedError::InvalidSeedEntry`] when the configured list is incomplete.
    /// Nothing is written in that case.
    pub async fn seed_if_empty(
        &self,
        configured: &[SeedEntry],
        environment: Environment,
    ) -> Result<usize, SeedError> {
        if environment.is_production() {
            tracing::debug!("Production environment, skipping seed data");
            return Ok(0);
        }

        if self.count_entries().await? > 0 {
            tracing::debug!("Feed database already seeded");
            return Ok(0);
        }

        let entries = resolve_seed_entries(configured)?;
        for entry in &entries {
            validate_persisted(&entry.title, &entry.web_address, &entry.route_name)
                .map_err(StorageError::from)?;
        }

        let mut tx = self.pool.begin().await?;
        for entry in &entries {
            sqlx::query(
                r#"
                INSERT INTO rss_feed_entry (title, web_address, route_name, open_in_new_tab)
                VALUES (?, ?, ?, ?)
            "#,
            )
            .bind(&entry.title)
            .bind(&entry.web_address)
            .bind(&entry.route_name)
            .bind(entry.open_in_new_tab)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        tracing::info!(count = entries.len(), environment = %environment, "Seeded feed database");
        Ok(entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::NewFeedEntry;

    async fn test_db() -> Database {
        Database::open(":memory:").await.unwrap()
    }

    #[test]
    fn test_default_seed_entries_are_complete() {
        let entries = default_seed_entries();
        assert_eq!(entries.len(), 4);
        assert!(entries.iter().all(SeedEntry::is_complete));
        assert_eq!(entries[3].route_name, "ErrorFeed");
    }

    #[test]
    fn test_resolve_rejects_incomplete_batch() {
        let configured = vec![
            SeedEntry::new("Good", "https://good.example.com", "Good"),
            SeedEntry::new("Bad", "", "Bad"),
        ];
        let err = resolve_seed_entries(&configured).unwrap_err();
        assert!(matches!(err, SeedError::InvalidSeedEntry { index: 1 }));
    }

    #[test]
    fn test_resolve_uses_configured_list() {
        let configured = vec![SeedEntry::new("Only", "https://only.example.com", "Only")];
        assert_eq!(resolve_seed_entries(&configured).unwrap(), configured);
    }

    #[tokio::test]
    async fn test_seed_development_empty_store() {
        let db = test_db().await;
        let count = db.seed_if_empty(&[], Environment::Development).await.unwrap();
        assert_eq!(count, 4);

        let entry = db.get_entry_by_route("Aspireify").await.unwrap().unwrap();
        assert_eq!(entry.title, "Aspireify Feed");
        assert!(!entry.open_in_new_tab);
    }

    #[tokio::test]
    async fn test_seed_skipped_in_production() {
        let db = test_db().await;
        let count = db.seed_if_empty(&[], Environment::Production).await.unwrap();
        assert_eq!(count, 0);
        assert_eq!(db.count_entries().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_seed_skipped_when_not_empty() {
        let db = test_db().await;
        db.create_entry(&NewFeedEntry::new("Mine", "https://mine.example.com"))
            .await
            .unwrap();

        let count = db.seed_if_empty(&[], Environment::Staging).await.unwrap();
        assert_eq!(count, 0);
        assert_eq!(db.count_entries().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_seed_invalid_config_writes_nothing() {
        let db = test_db().await;
        let configured = vec![SeedEntry::new("No Route", "https://x.example.com", " ")];
        let err = db
            .seed_if_empty(&configured, Environment::Development)
            .await
            .unwrap_err();
        assert!(matches!(err, SeedError::InvalidSeedEntry { index: 0 }));
        assert_eq!(db.count_entries().await.unwrap(), 0);
    }
}
