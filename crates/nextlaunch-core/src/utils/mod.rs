//! Formatting helpers shared by the selector and logging.

pub mod format;

pub use format::{age_display, format_previous_date, format_timestamp};
