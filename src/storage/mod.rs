mod entries;
mod schema;
mod seed;
mod types;

pub use schema::Database;
pub use seed::{default_seed_entries, resolve_seed_entries, SeedEntry, SeedError};
pub use types::{
    route_for_title, DatabaseError, FeedEntry, NewFeedEntry, StorageError,
    DISPLAY_FEED_BASE_ROUTE, MAX_ROUTED_TITLE_LEN,
};
