//! Utility functions shared by the storage layer and the command line.
//!
//! - **Validation**: column bounds, entry form rules, web address parsing
//! - **Text processing**: terminal-safe, width-aware output helpers

mod text;
mod validation;

pub use text::{display_width, pad_to_width, strip_control_chars, truncate_to_width};
pub use validation::{
    validate_persisted, validate_web_address, EntryForm, ValidationError, FORM_TITLE_MAX_LEN,
    FORM_TITLE_MIN_LEN, MAX_ROUTE_NAME_LEN, MAX_TITLE_LEN, MAX_WEB_ADDRESS_LEN,
};
