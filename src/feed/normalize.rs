//! Cleanup of raw link and description fragments taken from feed markup.
//!
//! Both cleaners follow the same policy:
//!
//! 1. blank input yields a default;
//! 2. input wrapped in the expected element yields the trimmed content of the
//!    first such element;
//! 3. anything else is trimmed and passed through.
//!
//! This is scraper-grade extraction, not XML parsing. Matching uses the
//! `regex` crate, which runs in time linear in the input, and every call is
//! held to [`MATCH_TIMEOUT`] and [`MAX_FRAGMENT_BYTES`]. Exceeding either is an
//! error: there is no sensible fallback text for a fragment that could not
//! be examined.

use regex::{Regex, RegexBuilder};
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Time budget for a single match.
pub const MATCH_TIMEOUT: Duration = Duration::from_secs(2);

/// Largest fragment the cleaners will look at (1 MiB).
pub const MAX_FRAGMENT_BYTES: usize = 1024 * 1024;

const LINK_PATTERN: &str = r"<link>(.*?)</link>";
const PARAGRAPH_PATTERN: &str = r"<p>(.*?)</p>";

static LINK_RE: OnceLock<Regex> = OnceLock::new();
static PARAGRAPH_RE: OnceLock<Regex> = OnceLock::new();

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("Fragment too large to normalize: {len} bytes (max {max})")]
    InputTooLarge { len: usize, max: usize },

    #[error("Pattern match exceeded {0:?}")]
    MatchTimeout(Duration),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

fn compiled(cell: &'static OnceLock<Regex>, pattern: &str) -> Result<&'static Regex, NormalizeError> {
    if let Some(re) = cell.get() {
        return Ok(re);
    }
    let re = RegexBuilder::new(pattern)
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()?;
    Ok(cell.get_or_init(|| re))
}

/// Content of the first capture group of `re` in `text`, or `None` when the
/// pattern does not occur.
fn first_capture<'t>(
    re: &Regex,
    text: &'t str,
    budget: Duration,
) -> Result<Option<&'t str>, NormalizeError> {
    if text.len() > MAX_FRAGMENT_BYTES {
        return Err(NormalizeError::InputTooLarge {
            len: text.len(),
            max: MAX_FRAGMENT_BYTES,
        });
    }

    let started = Instant::now();
    let captured = re
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str());

    if started.elapsed() >= budget {
        return Err(NormalizeError::MatchTimeout(budget));
    }

    Ok(captured)
}

fn clean_link_within(raw: &str, budget: Duration) -> Result<String, NormalizeError> {
    if raw.trim().is_empty() {
        return Ok(String::new());
    }

    let re = compiled(&LINK_RE, LINK_PATTERN)?;
    let cleaned = match first_capture(re, raw, budget)? {
        Some(inner) => inner.trim(),
        None => raw.trim(),
    };
    Ok(cleaned.to_string())
}

fn clean_description_within(
    raw: &str,
    fallback: &str,
    budget: Duration,
) -> Result<String, NormalizeError> {
    if raw.trim().is_empty() {
        return Ok(fallback.to_string());
    }

    let re = compiled(&PARAGRAPH_RE, PARAGRAPH_PATTERN)?;
    let cleaned = match first_capture(re, raw, budget)? {
        Some(inner) => inner.trim(),
        None => raw.trim(),
    };
    Ok(cleaned.to_string())
}

/// Extract a link from a raw fragment.
///
/// ```
/// use feedshelf::feed::clean_link;
///
/// assert_eq!(clean_link("<LINK> https://example.com/a </LINK>").unwrap(), "https://example.com/a");
/// assert_eq!(clean_link("  https://example.com/b ").unwrap(), "https://example.com/b");
/// assert_eq!(clean_link("   ").unwrap(), "");
/// ```
///
/// # Errors
///
/// [`NormalizeError`] when the fragment is too large or the match overruns
/// [`MATCH_TIMEOUT`].
pub fn clean_link(raw: &str) -> Result<String, NormalizeError> {
    clean_link_within(raw, MATCH_TIMEOUT)
}

/// Reduce a raw description to the content of its first paragraph.
///
/// Blank input returns `fallback` unchanged.
///
/// ```
/// use feedshelf::feed::clean_description;
///
/// assert_eq!(clean_description("<p>First</p><p>Second</p>", "").unwrap(), "First");
/// assert_eq!(clean_description("", "Alternate").unwrap(), "Alternate");
/// ```
///
/// # Errors
///
/// Same failure modes as [`clean_link`].
pub fn clean_description(raw: &str, fallback: &str) -> Result<String, NormalizeError> {
    clean_description_within(raw, fallback, MATCH_TIMEOUT)
}
