//! Next/previous launch selection for one rocket-name filter.
//!
//! Each refresh re-reads the shared timeline and rebuilds the state and
//! attributes from scratch. Selection walks the filtered events once in
//! timeline order: the first event at or after "now" is the next launch,
//! the last event strictly before "now" is the previous one.

use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use tracing::debug;

use crate::cache::FeedCache;
use crate::models::{DeviceClass, LaunchAttributes, LaunchEvent, RocketFilter, SensorSnapshot};
use crate::utils::{format_previous_date, format_timestamp};

/// State value when no future launch is known.
pub const NOT_PLANNED: &str = "Not planned";

/// Icon identifier exposed to the host.
pub const ICON: &str = "mdi:rocket";

/// Attribution attached to every attribute set.
pub const ATTRIBUTION: &str = "Data provided by Teamup";

/// Prefix of every selector name.
const NAME_PREFIX: &str = "Next Rocket ";

/// Result of one pass over the working set.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Selection<'a> {
    pub next: Option<&'a LaunchEvent>,
    pub previous: Option<&'a LaunchEvent>,
}

/// Events of `timeline` the filter tracks, in timeline order.
pub fn working_set<'a>(
    timeline: &'a [LaunchEvent],
    filter: &'a RocketFilter,
) -> impl Iterator<Item = &'a LaunchEvent> + 'a {
    timeline.iter().filter(move |e| filter.matches(e))
}

/// Single pass over `events` against one evaluation instant.
///
/// Order-dependent on purpose: with unsorted input the first future event
/// and the last past event win, not the ones closest to `now`.
pub fn select_launches<'a>(
    events: impl IntoIterator<Item = &'a LaunchEvent>,
    now: DateTime<Utc>,
) -> Selection<'a> {
    let mut selection = Selection::default();
    for event in events {
        if event.is_past(now) {
            selection.previous = Some(event);
        } else if selection.next.is_none() {
            selection.next = Some(event);
        }
    }
    selection
}

/// One tracked filter over the shared `FeedCache`.
pub struct LaunchSelector {
    filter: RocketFilter,
    feed: Arc<FeedCache>,
    name: String,
    state: String,
    attributes: LaunchAttributes,
    has_future: bool,
}

impl LaunchSelector {
    pub fn new(rocket_name: &str, feed: Arc<FeedCache>) -> Self {
        let filter = RocketFilter::parse(rocket_name);
        debug!(filter = %filter, "Initialize launch selector");
        Self {
            name: format!("{}{}", NAME_PREFIX, filter.label()),
            filter,
            feed,
            state: NOT_PLANNED.to_string(),
            attributes: LaunchAttributes::default(),
            has_future: false,
        }
    }

    /// Refresh the shared feed (throttled) and recompute this selector.
    pub async fn refresh(&mut self) {
        debug!(selector = %self.name, "Start update");

        self.has_future = false;
        self.feed.refresh().await;

        let Some(timeline) = self.feed.timeline().await else {
            debug!(selector = %self.name, "No timeline yet, keeping previous state");
            return;
        };

        self.evaluate(&timeline, Utc::now());
    }

    /// Recompute state and attributes from `timeline` as of `now`.
    pub fn evaluate(&mut self, timeline: &[LaunchEvent], now: DateTime<Utc>) {
        let selection = select_launches(working_set(timeline, &self.filter), now);

        let mut attributes = LaunchAttributes::default();

        match selection.next {
            Some(next) => {
                self.state = format_timestamp(&next.begin);
                attributes.comment = Some(next.name.clone());
                attributes.location = next.location.clone();
                attributes.url = next.url.clone();
            }
            None => self.state = NOT_PLANNED.to_string(),
        }
        self.has_future = selection.next.is_some();

        if let Some(previous) = selection.previous {
            attributes.previous = Some(previous.name.clone());
            attributes.previous_date = Some(format_previous_date(&previous.begin));
        }

        attributes.attribution = Some(ATTRIBUTION.to_string());
        attributes.last_update = Some(Local::now());
        self.attributes = attributes;

        debug!(selector = %self.name, state = %self.state, "Selection updated");
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn filter(&self) -> &RocketFilter {
        &self.filter
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn attributes(&self) -> &LaunchAttributes {
        &self.attributes
    }

    pub fn icon(&self) -> &'static str {
        ICON
    }

    pub fn has_future(&self) -> bool {
        self.has_future
    }

    pub fn device_class(&self) -> DeviceClass {
        if self.has_future {
            DeviceClass::Timestamp
        } else {
            DeviceClass::Text
        }
    }

    pub fn snapshot(&self) -> SensorSnapshot {
        SensorSnapshot {
            name: self.name.clone(),
            state: self.state.clone(),
            icon: ICON,
            device_class: self.device_class(),
            attributes: self.attributes.clone(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
