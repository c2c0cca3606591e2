//! Shared, throttled cache of the launch calendar.
//!
//! This module provides `FeedCache`, which owns the feed URL and the
//! latest parsed timeline. Fetches are spaced at least 15 minutes apart
//! no matter how often selectors ask for a refresh; failed fetches keep
//! the previous timeline.

pub mod feed_cache;

pub use feed_cache::{throttle_elapsed, FeedCache, MIN_TIME_BETWEEN_UPDATES};
