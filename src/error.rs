// File: ./src/error.rs
//! Typed failures for parsing and for the two remote collaborators.
use thiserror::Error;

/// Why a post could not be turned into a scheduled job.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// None of the date patterns matched the title (or hint text).
    #[error("Unable to parse time/date in title: {0}")]
    Title(String),

    /// The body carried no `{CALENDAR_HINT: ...}` block.
    #[error("Unable to find/parse calendar hint in selftext")]
    SelfText,

    /// A date anchor matched but the clock fragment after it did not.
    #[error("Unable to parse time fragment: {0}")]
    Time(String),

    /// The fields parsed fine but do not form a real calendar instant.
    #[error("Invalid start date/time: {year:04}-{month:02}-{day:02} {hour:02}:{minute:02}")]
    InvalidDateTime {
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
    },

    /// Start plus the configured event length is past the last representable instant.
    #[error("Event end is out of range: {start} plus {hours} hours")]
    EndOutOfRange { start: String, hours: i64 },
}

/// Failure talking to the remote calendar.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Calendar transport error: {0}")]
    Http(#[from] crate::client::http::HttpError),

    #[error("Calendar API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed calendar response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Calendar authentication failed: {0}")]
    Auth(String),

    #[error("Calendar rejected the request: {0}")]
    Rejected(String),
}

/// Failure talking to the source feed.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Feed transport error: {0}")]
    Http(#[from] crate::client::http::HttpError),

    #[error("Feed API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed feed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Feed authentication failed: {0}")]
    Auth(String),

    #[error("Feed rejected the request: {0}")]
    Rejected(String),
}

/// Failure that aborts a whole reconciliation pass.
#[derive(Debug, Error)]
pub enum PassError {
    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
