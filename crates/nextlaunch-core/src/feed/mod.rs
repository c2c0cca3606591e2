//! Calendar feed access.
//!
//! `FeedSource` fetches the raw iCalendar document; `parse_timeline`
//! turns it into a flat list of `LaunchEvent`s. Both report failures as
//! `FeedError`, which `FeedCache` logs and absorbs.

pub mod error;
pub mod parser;
pub mod source;

pub use error::FeedError;
pub use parser::parse_timeline;
pub use source::{FeedSource, HttpFeedSource};
