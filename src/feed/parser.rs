use chrono::{DateTime, Utc};
use feed_rs::parser;
use thiserror::Error;

use super::item::{FeedItem, RawFeedItem};
use super::normalize::NormalizeError;

#[derive(Debug, Error)]
pub enum ParseError {
    /// Payload is neither RSS, Atom nor JSON Feed
    #[error("Unreadable feed: {0}")]
    Feed(#[from] parser::ParseFeedError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

/// A parsed feed payload.
#[derive(Debug, Clone)]
pub struct ParsedFeed {
    /// Channel title, when the feed declares one
    pub title: Option<String>,
    pub items: Vec<FeedItem>,
}

/// Parse a feed payload into display items.
///
/// Every item's link and description go through the normalizer; `new_tab`
/// is copied onto each item. An item without a summary takes its
/// description from the content body.
pub fn parse_items(
    bytes: &[u8],
    new_tab: bool,
    fetched_at: DateTime<Utc>,
) -> Result<ParsedFeed, ParseError> {
    let feed = parser::parse(bytes)?;

    let items = feed
        .entries
        .into_iter()
        .map(|entry| {
            let content = entry.content.and_then(|c| c.body);
            // Atom entries often carry only a content body
            let description = entry
                .summary
                .map(|s| s.content)
                .filter(|s| !s.trim().is_empty())
                .or_else(|| content.clone());
            let raw = RawFeedItem {
                title: entry.title.map(|t| t.content),
                link: entry.links.first().map(|l| l.href.clone()),
                creator: entry.authors.first().map(|p| p.name.clone()),
                pub_date: entry.published.or(entry.updated).map(|dt| dt.to_rfc3339()),
                description,
                content,
            };
            FeedItem::from_raw(raw, new_tab, fetched_at)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ParsedFeed {
        title: feed.title.map(|t| t.content),
        items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0" xmlns:dc="http://purl.org/dc/elements/1.1/"><channel>
    <title>Example Channel</title>
    <item>
        <title>First post</title>
        <link>https://example.com/first</link>
        <dc:creator>Sam</dc:creator>
        <pubDate>Tue, 02 Jan 2024 08:30:00 GMT</pubDate>
        <description>&lt;p&gt;Lead paragraph&lt;/p&gt;&lt;p&gt;Rest&lt;/p&gt;</description>
    </item>
    <item>
        <title>Second post</title>
    </item>
</channel></rss>"#;

    fn fetched_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_rss_items() {
        let feed = parse_items(RSS.as_bytes(), true, fetched_at()).unwrap();
        assert_eq!(feed.title.as_deref(), Some("Example Channel"));
        assert_eq!(feed.items.len(), 2);

        let first = &feed.items[0];
        assert_eq!(first.title, "First post");
        assert_eq!(first.link, "https://example.com/first");
        assert_eq!(first.description, "Lead paragraph");
        assert_eq!(
            first.pub_date,
            Utc.with_ymd_and_hms(2024, 1, 2, 8, 30, 0).unwrap()
        );
        assert!(first.new_tab);

        let second = &feed.items[1];
        assert_eq!(second.link, "");
        assert_eq!(second.creator, "Unlisted");
        assert_eq!(second.description, "<p>No description</p>");
        assert_eq!(second.pub_date, fetched_at());
    }

    #[test]
    fn test_parse_atom_items() {
        let atom = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
    <title>Atom Channel</title>
    <id>urn:uuid:60a76c80-d399-11d9-b93C-0003939e0af6</id>
    <updated>2024-01-02T08:30:00Z</updated>
    <entry>
        <title>Atom entry</title>
        <link href="https://example.com/atom"/>
        <id>urn:uuid:1225c695-cfb8-4ebb-aaaa-80da344efa6a</id>
        <updated>2024-01-02T08:30:00Z</updated>
        <author><name>Robin</name></author>
        <summary>Plain summary</summary>
    </entry>
</feed>"#;
        let feed = parse_items(atom.as_bytes(), false, fetched_at()).unwrap();
        assert_eq!(feed.items.len(), 1);
        let item = &feed.items[0];
        assert_eq!(item.link, "https://example.com/atom");
        assert_eq!(item.creator, "Robin");
        assert_eq!(item.description, "Plain summary");
    }

    #[test]
    fn test_atom_content_body_used_without_summary() {
        let atom = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
    <title>Atom Channel</title>
    <id>urn:uuid:60a76c80-d399-11d9-b93C-0003939e0af6</id>
    <updated>2024-01-02T08:30:00Z</updated>
    <entry>
        <title>Content only</title>
        <link href="https://example.com/content"/>
        <id>urn:uuid:1225c695-cfb8-4ebb-aaaa-80da344efa6b</id>
        <updated>2024-01-02T08:30:00Z</updated>
        <content type="html">&lt;p&gt;Body lead&lt;/p&gt;&lt;p&gt;Body rest&lt;/p&gt;</content>
    </entry>
</feed>"#;
        let feed = parse_items(atom.as_bytes(), false, fetched_at()).unwrap();
        let item = &feed.items[0];
        assert_eq!(item.description, "Body lead");
        assert!(item.content.contains("Body rest"));
    }

    #[test]
    fn test_parse_garbage_fails() {
        let err = parse_items(b"<not valid xml", false, fetched_at()).unwrap_err();
        assert!(matches!(err, ParseError::Feed(_)));
    }
}
