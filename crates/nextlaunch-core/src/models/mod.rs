//! Data models for launch tracking.
//!
//! - `LaunchEvent`: one dated entry from the calendar feed
//! - `RocketFilter`: which events a selector tracks
//! - `LaunchAttributes`, `DeviceClass`, `SensorSnapshot`: what a selector
//!   exposes to the presentation layer

pub mod event;
pub mod sensor;

pub use event::{LaunchEvent, RocketFilter, ALL_ROCKETS};
pub use sensor::{DeviceClass, LaunchAttributes, SensorSnapshot};
