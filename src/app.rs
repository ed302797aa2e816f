//! Command handlers behind the `feedshelf` binary.
//!
//! Each handler does its storage or network work first and then renders to
//! the supplied writer, so the handlers can be driven from tests with a
//! `Vec<u8>`.
use anyhow::{Context, Result};
use std::io::Write;

use crate::config::Environment;
use crate::feed::{FeedClient, FeedItem};
use crate::storage::{Database, FeedEntry, NewFeedEntry, SeedEntry};
use crate::util::{pad_to_width, strip_control_chars, truncate_to_width, EntryForm};

const TITLE_COLUMN: usize = 30;
const ROUTE_COLUMN: usize = 32;
const DESCRIPTION_WIDTH: usize = 240;

/// How a command identifies the entry it acts on.
#[derive(Debug, Clone)]
pub enum Lookup {
    Title(String),
    Route(String),
}

/// Field changes requested by `edit`. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct EntryChanges {
    pub title: Option<String>,
    pub web_address: Option<String>,
    pub open_in_new_tab: Option<bool>,
}

/// Application state shared by all commands.
pub struct App {
    db: Database,
    client: FeedClient,
    item_limit: usize,
}

impl App {
    pub fn new(db: Database, client: FeedClient, item_limit: usize) -> Self {
        Self {
            db,
            client,
            item_limit,
        }
    }

    async fn find(&self, lookup: &Lookup) -> Result<Option<FeedEntry>> {
        let entry = match lookup {
            Lookup::Title(title) => self.db.get_entry_by_title(title).await?,
            Lookup::Route(route) => self.db.get_entry_by_route(route).await?,
        };
        Ok(entry)
    }

    /// Print every entry as a table, or as JSON.
    pub async fn list(&self, out: &mut dyn Write, json: bool) -> Result<()> {
        let entries = self.db.get_all_entries().await?;

        if json {
            let body = serde_json::to_string_pretty(&entries)?;
            writeln!(out, "{}", body)?;
            return Ok(());
        }

        if entries.is_empty() {
            writeln!(out, "No feeds yet. Add one with: feedshelf add <title> <url>")?;
            return Ok(());
        }

        writeln!(
            out,
            "{} {} {} WEB ADDRESS",
            pad_to_width("TITLE", TITLE_COLUMN),
            pad_to_width("ROUTE", ROUTE_COLUMN),
            pad_to_width("NEW TAB", 7),
        )?;
        for entry in &entries {
            writeln!(
                out,
                "{} {} {} {}",
                pad_to_width(&entry.title, TITLE_COLUMN),
                pad_to_width(&entry.route_name, ROUTE_COLUMN),
                pad_to_width(if entry.open_in_new_tab { "yes" } else { "no" }, 7),
                entry.web_address
            )?;
        }
        Ok(())
    }

    /// Print one entry. Returns `false` when it does not exist.
    pub async fn show(&self, out: &mut dyn Write, lookup: &Lookup) -> Result<bool> {
        let Some(entry) = self.find(lookup).await? else {
            writeln!(out, "No feed entry matches {}", describe(lookup))?;
            return Ok(false);
        };

        writeln!(out, "Title:       {}", entry.title)?;
        writeln!(out, "Web address: {}", entry.web_address)?;
        writeln!(out, "Route:       {}", entry.route_name)?;
        writeln!(out, "New tab:     {}", entry.open_in_new_tab)?;
        Ok(true)
    }

    /// Validate the form and store a new entry.
    pub async fn add(
        &self,
        out: &mut dyn Write,
        form: &EntryForm,
        route_name: Option<&str>,
    ) -> Result<()> {
        form.validate()?;

        let mut entry = NewFeedEntry::new(form.title.trim(), form.web_address.trim())
            .open_in_new_tab(form.open_in_new_tab);
        if let Some(route) = route_name {
            entry = entry.with_route(route);
        }

        self.db
            .create_entry(&entry)
            .await
            .with_context(|| format!("Failed to add feed '{}'", entry.title))?;

        writeln!(
            out,
            "Added '{}' at {}",
            entry.title,
            entry.resolved_route()
        )?;
        Ok(())
    }

    /// Apply changes to the entry titled `title`. Returns the rows written.
    pub async fn edit(
        &self,
        out: &mut dyn Write,
        title: &str,
        changes: &EntryChanges,
    ) -> Result<u64> {
        let Some(existing) = self.db.get_entry_by_title(title).await? else {
            writeln!(out, "No feed entry titled '{}'", title)?;
            return Ok(0);
        };

        let new_title = changes.title.as_deref().map(str::trim).unwrap_or_default();
        let new_address = changes
            .web_address
            .as_deref()
            .map(str::trim)
            .unwrap_or_default();
        let open_in_new_tab = changes
            .open_in_new_tab
            .unwrap_or(existing.open_in_new_tab);

        if !new_title.is_empty() || !new_address.is_empty() {
            let effective = EntryForm::new(
                if new_title.is_empty() { &existing.title } else { new_title },
                if new_address.is_empty() { &existing.web_address } else { new_address },
                open_in_new_tab,
            );
            effective.validate()?;
        }

        let updated = FeedEntry::draft(new_title, new_address, open_in_new_tab);
        let written = self
            .db
            .update_entry(&existing, &updated)
            .await
            .with_context(|| format!("Failed to update feed '{}'", existing.title))?;

        if written == 0 {
            writeln!(out, "'{}' was not updated", existing.title)?;
        } else {
            writeln!(out, "Updated '{}'", existing.title)?;
        }
        Ok(written)
    }

    /// Delete the entry titled `title`. Returns the rows removed.
    pub async fn remove(&self, out: &mut dyn Write, title: &str) -> Result<u64> {
        let removed = self.db.remove_entry(title).await?;
        if removed == 0 {
            writeln!(out, "No feed entry titled '{}'", title)?;
        } else {
            writeln!(out, "Removed '{}'", title)?;
        }
        Ok(removed)
    }

    /// Fetch an entry's feed and print its newest items.
    /// Returns `false` when the entry does not exist.
    pub async fn read(
        &self,
        out: &mut dyn Write,
        lookup: &Lookup,
        limit: Option<usize>,
    ) -> Result<bool> {
        let Some(entry) = self.find(lookup).await? else {
            writeln!(out, "No feed entry matches {}", describe(lookup))?;
            return Ok(false);
        };

        let feed = self
            .client
            .load_feed(&entry)
            .await
            .with_context(|| format!("Failed to load '{}' from {}", entry.title, entry.web_address))?;

        let limit = limit.unwrap_or(self.item_limit);
        let heading = feed.title.as_deref().unwrap_or(&entry.title);
        writeln!(
            out,
            "{} ({} items)",
            strip_control_chars(heading),
            feed.items.len()
        )?;

        for (index, item) in feed.items.iter().take(limit).enumerate() {
            writeln!(out)?;
            render_item(out, index + 1, item)?;
        }
        Ok(true)
    }

    /// Seed an empty database. Returns the number of entries written.
    pub async fn seed(
        &self,
        out: &mut dyn Write,
        seeds: &[SeedEntry],
        environment: Environment,
    ) -> Result<usize> {
        let inserted = self
            .db
            .seed_if_empty(seeds, environment)
            .await
            .context("Failed to seed feed database")?;

        if inserted > 0 {
            writeln!(out, "Seeded {} feed entries", inserted)?;
        } else if environment.is_production() {
            writeln!(out, "Seed data is not written in the production environment")?;
        } else {
            writeln!(out, "Database already has feed entries, nothing seeded")?;
        }
        Ok(inserted)
    }
}

fn describe(lookup: &Lookup) -> String {
    match lookup {
        Lookup::Title(title) => format!("title '{}'", title),
        Lookup::Route(route) => format!("route '{}'", route),
    }
}

fn render_item(out: &mut dyn Write, number: usize, item: &FeedItem) -> std::io::Result<()> {
    writeln!(out, "{}. {}", number, strip_control_chars(&item.title))?;
    writeln!(
        out,
        "   {} by {}",
        item.pub_date.format("%Y-%m-%d %H:%M UTC"),
        strip_control_chars(&item.creator)
    )?;
    if !item.link.is_empty() {
        let marker = if item.new_tab { " (new tab)" } else { "" };
        writeln!(out, "   {}{}", strip_control_chars(&item.link), marker)?;
    }
    let description = strip_control_chars(&item.description);
    writeln!(out, "   {}", truncate_to_width(&description, DESCRIPTION_WIDTH))?;
    Ok(())
}
