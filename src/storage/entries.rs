use super::schema::Database;
use super::types::{
    check_routed_title, route_for_title, FeedEntry, FeedEntryRow, NewFeedEntry, StorageError,
};
use crate::util::validate_persisted;

const ENTRY_COLUMNS: &str = "id, title, web_address, route_name, open_in_new_tab, version";

impl Database {
    // ========================================================================
    // Feed Entry Operations
    // ========================================================================

    /// Insert a new feed entry.
    ///
    /// Title and web address are stored trimmed. The route is derived from
    /// the title when the entry carries none.
    ///
    /// # Returns
    ///
    /// The number of rows inserted (always 1 on success).
    ///
    /// # Errors
    ///
    /// - [`StorageError::Validation`] if a field breaks the column bounds, or
    ///   the title is too long for a derived route
    /// - [`StorageError::DuplicateTitle`] if an entry with this title exists
    pub async fn create_entry(&self, entry: &NewFeedEntry) -> Result<u64, StorageError> {
        let title = entry.title.trim();
        let web_address = entry.web_address.trim();
        let route_name = entry.resolved_route();
        if entry.derives_route() {
            check_routed_title(title)?;
        }
        validate_persisted(title, web_address, &route_name)?;

        tracing::info!(
            title = %title,
            web_address = %web_address,
            route_name = %route_name,
            open_in_new_tab = entry.open_in_new_tab,
            "Creating feed entry"
        );

        let result = sqlx::query(
            r#"
            INSERT INTO rss_feed_entry (title, web_address, route_name, open_in_new_tab)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(title) DO NOTHING
        "#,
        )
        .bind(title)
        .bind(web_address)
        .bind(&route_name)
        .bind(entry.open_in_new_tab)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            tracing::warn!(title = %title, "Feed entry with this title already exists");
            return Err(StorageError::DuplicateTitle(title.to_string()));
        }

        Ok(result.rows_affected())
    }

    /// Get every feed entry, in insertion order.
    pub async fn get_all_entries(&self) -> Result<Vec<FeedEntry>, StorageError> {
        let rows: Vec<FeedEntryRow> = sqlx::query_as(&format!(
            "SELECT {} FROM rss_feed_entry ORDER BY id",
            ENTRY_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(FeedEntryRow::into_entry).collect())
    }

    /// Number of stored feed entries.
    pub async fn count_entries(&self) -> Result<i64, StorageError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM rss_feed_entry")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Look up an entry by exact title.
    ///
    /// # Returns
    ///
    /// `None` when no entry has this title.
    pub async fn get_entry_by_title(&self, title: &str) -> Result<Option<FeedEntry>, StorageError> {
        let row = self.find_row_by_title(title).await?;

        match row {
            Some(row) => {
                tracing::debug!(title = %title, "Feed entry found");
                Ok(Some(row.into_entry()))
            }
            None => {
                tracing::warn!(title = %title, "No feed entry found with this title");
                Ok(None)
            }
        }
    }

    /// Look up an entry by exact route name.
    ///
    /// # Returns
    ///
    /// `None` when no entry has this route.
    pub async fn get_entry_by_route(
        &self,
        route_name: &str,
    ) -> Result<Option<FeedEntry>, StorageError> {
        let row: Option<FeedEntryRow> = sqlx::query_as(&format!(
            "SELECT {} FROM rss_feed_entry WHERE route_name = ? ORDER BY id LIMIT 1",
            ENTRY_COLUMNS
        ))
        .bind(route_name)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                tracing::debug!(route_name = %route_name, "Feed entry found");
                Ok(Some(row.into_entry()))
            }
            None => {
                tracing::warn!(route_name = %route_name, "No feed entry found with this route");
                Ok(None)
            }
        }
    }

    /// Apply the fields of `updated` to the stored entry titled `existing.title`.
    ///
    /// Merge rules:
    /// - `title` and `web_address` are replaced only when the new value is
    ///   non-blank and differs from the stored one
    /// - `route_name` is always re-derived from the resulting title
    /// - `open_in_new_tab` is always replaced
    ///
    /// The write is a compare-and-swap on the row version read during the
    /// lookup, so a concurrent writer that got there first wins and this call
    /// persists nothing.
    ///
    /// # Returns
    ///
    /// The number of rows written: 0 when the entry is missing, corrupt, or was
    /// changed concurrently; 1 otherwise.
    ///
    /// # Errors
    ///
    /// - [`StorageError::Validation`] if the merged entry breaks column bounds
    /// - [`StorageError::DuplicateTitle`] if the new title belongs to another entry
    pub async fn update_entry(
        &self,
        existing: &FeedEntry,
        updated: &FeedEntry,
    ) -> Result<u64, StorageError> {
        let Some(row) = self.find_row_by_title(&existing.title).await? else {
            tracing::warn!(
                title = %existing.title,
                "No feed entry with this title was found, no update performed"
            );
            return Ok(0);
        };

        if row.title.trim().is_empty() {
            tracing::error!(
                id = row.id,
                title = %existing.title,
                web_address = %existing.web_address,
                open_in_new_tab = row.open_in_new_tab,
                "A feed entry with no title was returned; the record may be corrupt"
            );
            return Ok(0);
        }

        self.write_merged(row, updated).await
    }

    /// Merge `updated` into a previously read row and write it back if the
    /// row version is still the one that was read.
    async fn write_merged(
        &self,
        mut row: FeedEntryRow,
        updated: &FeedEntry,
    ) -> Result<u64, StorageError> {
        let id = row.id;
        let version = row.version;
        let previous_title = row.title.clone();

        let new_address = updated.web_address.trim();
        if !new_address.is_empty() && row.web_address != new_address {
            row.web_address = new_address.to_string();
        }

        let new_title = updated.title.trim();
        if !new_title.is_empty() && row.title != new_title {
            if let Some(other) = self.find_row_by_title(new_title).await? {
                if other.id != id {
                    return Err(StorageError::DuplicateTitle(new_title.to_string()));
                }
            }
            row.title = new_title.to_string();
        }

        row.route_name = route_for_title(&row.title);
        row.open_in_new_tab = updated.open_in_new_tab;

        check_routed_title(&row.title)?;
        validate_persisted(&row.title, &row.web_address, &row.route_name)?;

        let result = sqlx::query(
            r#"
            UPDATE rss_feed_entry
            SET title = ?, web_address = ?, route_name = ?, open_in_new_tab = ?,
                version = version + 1
            WHERE id = ? AND version = ?
        "#,
        )
        .bind(&row.title)
        .bind(&row.web_address)
        .bind(&row.route_name)
        .bind(row.open_in_new_tab)
        .bind(id)
        .bind(version)
        .execute(&self.pool)
        .await;

        let result = match result {
            Ok(result) => result,
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                return Err(StorageError::DuplicateTitle(row.title));
            }
            Err(e) => return Err(e.into()),
        };

        if result.rows_affected() == 0 {
            tracing::warn!(
                id = id,
                title = %previous_title,
                "Feed entry changed or was removed concurrently, update not applied"
            );
        } else {
            tracing::info!(id = id, title = %row.title, "Feed entry updated");
        }

        Ok(result.rows_affected())
    }

    /// Permanently delete the entry with this exact title.
    ///
    /// # Returns
    ///
    /// The number of rows removed (0 or 1).
    pub async fn remove_entry(&self, title: &str) -> Result<u64, StorageError> {
        let result = sqlx::query("DELETE FROM rss_feed_entry WHERE title = ?")
            .bind(title)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            tracing::warn!(title = %title, "No feed entry found to remove");
        } else {
            tracing::info!(title = %title, "Feed entry removed");
        }

        Ok(result.rows_affected())
    }

    async fn find_row_by_title(&self, title: &str) -> Result<Option<FeedEntryRow>, sqlx::Error> {
        sqlx::query_as(&format!(
            "SELECT {} FROM rss_feed_entry WHERE title = ?",
            ENTRY_COLUMNS
        ))
        .bind(title)
        .fetch_optional(&self.pool)
        .await
    }
}
