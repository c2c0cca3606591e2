//! Core library for nextlaunch.
//!
//! Fetches a public rocket-launch calendar feed, keeps the parsed
//! timeline in a throttled shared cache, and derives the next and the
//! previous launch for each configured rocket-name filter.
//!
//! - `cache`: `FeedCache`, the shared, throttled view of the feed
//! - `feed`: HTTP source, iCalendar parsing, and `FeedError`
//! - `models`: `LaunchEvent`, `RocketFilter`, and sensor output types
//! - `selector`: `LaunchSelector`, one per rocket-name filter

pub mod cache;
pub mod feed;
pub mod models;
pub mod selector;
pub mod utils;

pub use cache::FeedCache;
pub use feed::{FeedError, FeedSource, HttpFeedSource};
pub use models::{DeviceClass, LaunchAttributes, LaunchEvent, RocketFilter, SensorSnapshot};
pub use selector::LaunchSelector;
