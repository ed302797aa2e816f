//! Feed content: downloading, parsing and text cleanup.
//!
//! - [`normalize`] - link and description cleaners for raw feed fragments
//! - [`item`] - the display-ready [`FeedItem`] and its defaults
//! - [`parser`] - payload to items, using the `feed-rs` crate
//! - [`fetcher`] - HTTP retrieval with a bounded timeout
//!
//! # Example
//!
//! ```ignore
//! use feedshelf::feed::FeedClient;
//!
//! let client = FeedClient::new(&config.fetch)?;
//! let feed = client.load_feed(&entry).await?;
//! for item in feed.items {
//!     println!("{} - {}", item.title, item.link);
//! }
//! ```

pub mod fetcher;
pub mod item;
pub mod normalize;
pub mod parser;

pub use fetcher::{FeedClient, FetchError};
pub use item::{FeedItem, RawFeedItem};
pub use normalize::{clean_description, clean_link, NormalizeError};
pub use parser::{parse_items, ParseError, ParsedFeed};
