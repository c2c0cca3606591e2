use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Filter value that selects every event in the timeline.
pub const ALL_ROCKETS: &str = "ALL";

/// A single launch entry from the feed. Never mutated after parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchEvent {
    pub name: String,
    pub begin: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl LaunchEvent {
    pub fn new(name: impl Into<String>, begin: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            begin,
            location: None,
            url: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// True if the launch starts strictly before `now`.
    pub fn is_past(&self, now: DateTime<Utc>) -> bool {
        self.begin < now
    }
}

/// Rocket-name filter for a selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RocketFilter {
    /// The `"ALL"` sentinel: every event matches.
    All,
    /// Case-sensitive substring of the event name.
    Name(String),
}

impl RocketFilter {
    /// Only the exact string `"ALL"` is the sentinel; `"all"` is a name filter.
    pub fn parse(value: &str) -> Self {
        if value == ALL_ROCKETS {
            RocketFilter::All
        } else {
            RocketFilter::Name(value.to_string())
        }
    }

    pub fn matches(&self, event: &LaunchEvent) -> bool {
        match self {
            RocketFilter::All => true,
            RocketFilter::Name(needle) => event.name.contains(needle.as_str()),
        }
    }

    /// The configured string, used to build the selector name.
    pub fn label(&self) -> &str {
        match self {
            RocketFilter::All => ALL_ROCKETS,
            RocketFilter::Name(needle) => needle,
        }
    }
}

impl std::fmt::Display for RocketFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
