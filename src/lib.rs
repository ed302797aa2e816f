//! Feed shelf: a small catalogue of RSS/Atom feed subscriptions.
//!
//! Entries are stored in SQLite and looked up by title or display route.
//! Feeds are fetched on demand and their items cleaned up for display.

pub mod app;
pub mod config;
pub mod feed;
pub mod storage;
pub mod util;
