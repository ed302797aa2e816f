use serde::Serialize;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Database-specific errors with user-friendly messages
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Another process holds a lock on the database file
    #[error("The feed database is locked by another process. Please close it and try again.")]
    InstanceLocked,

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// Generic database error
    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Check if a sqlx error indicates database locking
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        if is_lock_message(&err.to_string()) {
            return DatabaseError::InstanceLocked;
        }
        DatabaseError::Other(err)
    }
}

/// SQLITE_BUSY (5), SQLITE_LOCKED (6) and SQLITE_CANTOPEN (14) all surface
/// through the error message only.
pub(crate) fn is_lock_message(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("database is locked")
        || message.contains("database table is locked")
        || message.contains("sqlite_busy")
        || message.contains("sqlite_locked")
        || message.contains("unable to open database file")
}

/// Errors returned by feed entry operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A field breaks the persisted column bounds
    #[error(transparent)]
    Validation(#[from] crate::util::ValidationError),

    /// Title is the lookup key, so a second entry with the same title is refused
    #[error("A feed entry titled '{0}' already exists")]
    DuplicateTitle(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        StorageError::Database(DatabaseError::from_sqlx(err))
    }
}

// ============================================================================
// Data Structures
// ============================================================================

/// Base path of the in-app page that displays a single feed.
pub const DISPLAY_FEED_BASE_ROUTE: &str = "/displayfeed/";

/// Derive the route name for a feed entry from its title.
///
/// Surrounding whitespace is trimmed, inner spaces are kept.
pub fn route_for_title(title: &str) -> String {
    format!("{}{}", DISPLAY_FEED_BASE_ROUTE, title.trim())
}

/// Longest title whose derived route still fits the route column.
pub const MAX_ROUTED_TITLE_LEN: usize =
    crate::util::MAX_ROUTE_NAME_LEN - DISPLAY_FEED_BASE_ROUTE.len();

/// Reject a title whose derived route would overflow the route column.
pub(crate) fn check_routed_title(title: &str) -> Result<(), crate::util::ValidationError> {
    let len = title.trim().chars().count();
    if len > MAX_ROUTED_TITLE_LEN {
        return Err(crate::util::ValidationError::TooLong {
            field: "title",
            max: MAX_ROUTED_TITLE_LEN,
            len,
        });
    }
    Ok(())
}

/// A stored feed subscription.
///
/// Values handed out by [`Database`](super::Database) are snapshots; mutating
/// one has no effect on storage until it is passed back to an update call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedEntry {
    pub id: i64,
    pub title: String,
    pub web_address: String,
    pub route_name: String,
    pub open_in_new_tab: bool,
}

impl FeedEntry {
    /// Build a detached entry (id 0) for use as the `updated` side of
    /// [`Database::update_entry`](super::Database::update_entry).
    pub fn draft(title: &str, web_address: &str, open_in_new_tab: bool) -> Self {
        Self {
            id: 0,
            title: title.to_string(),
            web_address: web_address.to_string(),
            route_name: route_for_title(title),
            open_in_new_tab,
        }
    }
}

/// Input for creating a feed entry.
#[derive(Debug, Clone)]
pub struct NewFeedEntry {
    pub title: String,
    pub web_address: String,
    /// Explicit route; derived from the title when `None`
    pub route_name: Option<String>,
    pub open_in_new_tab: bool,
}

impl NewFeedEntry {
    pub fn new(title: &str, web_address: &str) -> Self {
        Self {
            title: title.to_string(),
            web_address: web_address.to_string(),
            route_name: None,
            open_in_new_tab: false,
        }
    }

    pub fn with_route(mut self, route_name: &str) -> Self {
        self.route_name = Some(route_name.to_string());
        self
    }

    pub fn open_in_new_tab(mut self, open: bool) -> Self {
        self.open_in_new_tab = open;
        self
    }

    /// Whether the persisted route comes from the title.
    pub fn derives_route(&self) -> bool {
        self.route_name
            .as_deref()
            .map_or(true, |route| route.trim().is_empty())
    }

    /// The route that will be persisted for this entry.
    pub fn resolved_route(&self) -> String {
        match &self.route_name {
            Some(route) if !route.trim().is_empty() => route.clone(),
            _ => route_for_title(&self.title),
        }
    }
}

/// Internal row type for entry queries (used by sqlx FromRow)
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct FeedEntryRow {
    pub id: i64,
    pub title: String,
    pub web_address: String,
    pub route_name: String,
    pub open_in_new_tab: bool,
    pub version: i64,
}

impl FeedEntryRow {
    pub(crate) fn into_entry(self) -> FeedEntry {
        FeedEntry {
            id: self.id,
            title: self.title,
            web_address: self.web_address,
            route_name: self.route_name,
            open_in_new_tab: self.open_in_new_tab,
        }
    }
}
