use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Unexpected status {status} from {url}")]
    Status { status: StatusCode, url: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Malformed calendar: {0}")]
    Parse(#[from] ical::parser::ParserError),

    #[error("Calendar contains no VCALENDAR component")]
    Empty,

    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error("Unsupported calendar feature: {0}")]
    Unsupported(String),
}

impl FeedError {
    pub fn from_status(status: StatusCode, url: &str) -> Self {
        FeedError::Status {
            status,
            url: url.to_string(),
        }
    }

    /// Transport failures (status or network) as opposed to document problems.
    pub fn is_transport(&self) -> bool {
        matches!(self, FeedError::Status { .. } | FeedError::Network(_))
    }
}
