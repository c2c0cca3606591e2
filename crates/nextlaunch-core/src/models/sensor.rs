use chrono::{DateTime, Local};
use serde::Serialize;

/// How a consumer should interpret the sensor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    /// State is an ISO 8601 timestamp.
    Timestamp,
    /// State is plain text (`"Not planned"`).
    #[default]
    Text,
}

impl std::fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceClass::Timestamp => write!(f, "timestamp"),
            DeviceClass::Text => write!(f, "text"),
        }
    }
}

/// Attribute set published alongside the state.
///
/// Fields are filled per branch of a refresh: the next-launch fields only
/// when a future launch exists, the previous-launch fields only when a
/// past one does.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LaunchAttributes {
    #[serde(rename = "Comment", skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(rename = "Location", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(rename = "Url", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "Previous", skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,
    #[serde(rename = "Previous date", skip_serializing_if = "Option::is_none")]
    pub previous_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_update: Option<DateTime<Local>>,
}

/// Serializable view of one selector, as read by the host.
#[derive(Debug, Clone, Serialize)]
pub struct SensorSnapshot {
    pub name: String,
    pub state: String,
    pub icon: &'static str,
    pub device_class: DeviceClass,
    pub attributes: LaunchAttributes,
}
