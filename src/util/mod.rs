//! Utility functions for common operations.
//!
//! - **URL validation**: submission checks for new feed URLs
//! - **Text processing**: terminal-safe rendering of feed text

mod text;
mod url_validator;

pub use text::{display_width, plain_text, strip_control_chars, truncate_to_width};
pub use url_validator::validate_feed_url;
