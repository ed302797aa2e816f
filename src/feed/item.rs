use chrono::{DateTime, Utc};
use serde::Serialize;

use super::normalize::{clean_description, clean_link, NormalizeError};

pub const DEFAULT_TITLE: &str = "Untitled";
pub const DEFAULT_CREATOR: &str = "Unlisted";
pub const DEFAULT_DESCRIPTION: &str = "<p>No description</p>";
pub const DEFAULT_CONTENT: &str = "None";

/// Raw fields of one item as they came out of a feed payload.
#[derive(Debug, Clone, Default)]
pub struct RawFeedItem {
    pub title: Option<String>,
    pub link: Option<String>,
    pub creator: Option<String>,
    pub pub_date: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
}

/// One article of a fetched feed, ready for display. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub creator: String,
    pub pub_date: DateTime<Utc>,
    pub description: String,
    pub content: String,
    /// Whether the link should open in a new tab; copied from the feed entry
    pub new_tab: bool,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a publication date as RFC 2822 (RSS) or RFC 3339 (Atom).
pub fn parse_pub_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

impl FeedItem {
    /// Build an item from raw fields, cleaning link and description.
    ///
    /// Missing fields take their display defaults. A missing or unreadable
    /// publication date becomes `fetched_at`.
    ///
    /// # Errors
    ///
    /// Propagates [`NormalizeError`] from the link and description cleaners.
    pub fn from_raw(
        raw: RawFeedItem,
        new_tab: bool,
        fetched_at: DateTime<Utc>,
    ) -> Result<Self, NormalizeError> {
        let link = clean_link(raw.link.as_deref().unwrap_or_default())?;
        let description = clean_description(
            raw.description.as_deref().unwrap_or_default(),
            DEFAULT_DESCRIPTION,
        )?;

        let pub_date = match raw.pub_date.as_deref() {
            Some(value) if !value.trim().is_empty() => parse_pub_date(value).unwrap_or_else(|| {
                tracing::debug!(pub_date = %value, "Unreadable publication date, using fetch time");
                fetched_at
            }),
            _ => fetched_at,
        };

        Ok(Self {
            title: non_blank(raw.title).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            link,
            creator: non_blank(raw.creator).unwrap_or_else(|| DEFAULT_CREATOR.to_string()),
            pub_date,
            description,
            content: non_blank(raw.content).unwrap_or_else(|| DEFAULT_CONTENT.to_string()),
            new_tab,
        })
    }
}
