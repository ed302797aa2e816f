use thiserror::Error;
use url::Url;

/// Column limits of the `rss_feed_entry` table.
pub const MAX_TITLE_LEN: usize = 100;
pub const MAX_WEB_ADDRESS_LEN: usize = 200;
pub const MAX_ROUTE_NAME_LEN: usize = 100;

/// Title limits of the editable entry form.
pub const FORM_TITLE_MIN_LEN: usize = 3;
pub const FORM_TITLE_MAX_LEN: usize = 30;

/// Errors raised when a feed entry field fails a bound or format check.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Make up a short title for this RSS Feed.")]
    MissingTitle,

    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("{field} must be at least {min} characters (got {len})")]
    TooShort {
        field: &'static str,
        min: usize,
        len: usize,
    },

    #[error("{field} must be at most {max} characters (got {len})")]
    TooLong {
        field: &'static str,
        max: usize,
        len: usize,
    },

    #[error("The url does not match an expected format.")]
    InvalidUrl(String),
}

fn check_max(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len > max {
        return Err(ValidationError::TooLong { field, max, len });
    }
    Ok(())
}

fn check_required(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required { field });
    }
    Ok(())
}

/// Check the fields of an entry against the persisted column bounds.
///
/// All three fields are required and bounded by the table definition.
pub fn validate_persisted(
    title: &str,
    web_address: &str,
    route_name: &str,
) -> Result<(), ValidationError> {
    check_required("title", title)?;
    check_required("web_address", web_address)?;
    check_required("route_name", route_name)?;
    check_max("title", title, MAX_TITLE_LEN)?;
    check_max("web_address", web_address, MAX_WEB_ADDRESS_LEN)?;
    check_max("route_name", route_name, MAX_ROUTE_NAME_LEN)?;
    Ok(())
}

/// Parse a feed source address.
///
/// Only `http` and `https` URLs with a host are accepted.
pub fn validate_web_address(raw: &str) -> Result<Url, ValidationError> {
    let trimmed = raw.trim();
    let url = Url::parse(trimmed).map_err(|_| ValidationError::InvalidUrl(trimmed.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(ValidationError::InvalidUrl(trimmed.to_string())),
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(ValidationError::InvalidUrl(trimmed.to_string()));
    }

    Ok(url)
}

/// The editable form used to add or change a feed entry.
#[derive(Debug, Clone, Default)]
pub struct EntryForm {
    pub title: String,
    pub web_address: String,
    pub open_in_new_tab: bool,
}

impl EntryForm {
    pub fn new(title: &str, web_address: &str, open_in_new_tab: bool) -> Self {
        Self {
            title: title.to_string(),
            web_address: web_address.to_string(),
            open_in_new_tab,
        }
    }

    /// Validate the form, returning the first failing rule.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::MissingTitle);
        }
        let len = title.chars().count();
        if len < FORM_TITLE_MIN_LEN {
            return Err(ValidationError::TooShort {
                field: "title",
                min: FORM_TITLE_MIN_LEN,
                len,
            });
        }
        check_max("title", title, FORM_TITLE_MAX_LEN)?;

        check_required("web_address", &self.web_address)?;
        validate_web_address(&self.web_address)?;
        Ok(())
    }
}
