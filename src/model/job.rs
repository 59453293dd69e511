// File: ./src/model/job.rs
use crate::error::ParseError;
use crate::model::parser::{TemporalHint, parse_post};
use chrono::{DateTime, NaiveDate, Utc};

/// Shown in the calendar when a post carries no flair.
pub const MISSING_FLAIR: &str = "JOB FLAIR?";

/// A post as read from the source feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourcePost {
    pub id: String,
    pub author: String,
    pub title: String,
    pub body: String,
    pub url: String,
    pub permalink: String,
    pub flair: Option<String>,
}

/// One parsed run announcement.
///
/// Built fresh for every reconciliation decision and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRecord {
    pub external_id: String,
    pub author: String,
    pub raw_title: String,
    pub raw_body: String,
    pub display_url: String,
    pub permalink: String,
    pub state_tag: Option<String>,
    pub group_tag: String,
    pub name: String,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub timezone_label: String,
}

impl JobRecord {
    /// Parses a post, preferring a calendar hint in the body over the title.
    pub fn from_post(post: &SourcePost) -> Result<Self, ParseError> {
        let hint = parse_post(&post.title, &post.body)?;
        Ok(Self::with_hint(post, hint))
    }

    pub fn with_hint(post: &SourcePost, hint: TemporalHint) -> Self {
        Self {
            external_id: post.id.clone(),
            author: post.author.clone(),
            raw_title: post.title.clone(),
            raw_body: post.body.clone(),
            display_url: post.url.clone(),
            permalink: post.permalink.clone(),
            state_tag: post.flair.clone(),
            group_tag: hint.group_tag,
            name: hint.name,
            year: hint.year,
            month: hint.month,
            day: hint.day,
            hour: hint.hour,
            minute: hint.minute,
            timezone_label: hint.timezone,
        }
    }

    /// Flair, or the placeholder when the post has none.
    pub fn flair(&self) -> &str {
        self.state_tag.as_deref().unwrap_or(MISSING_FLAIR)
    }

    /// Name as displayed in the calendar, metaplot included.
    pub fn display_name(&self) -> String {
        if self.group_tag.is_empty() {
            self.name.clone()
        } else {
            format!("[{}] {}", self.group_tag, self.name)
        }
    }

    /// The start time read as UTC.
    ///
    /// The timezone label is only passed through to the calendar for display;
    /// it is never used to shift the instant.
    pub fn start_instant(&self) -> Result<DateTime<Utc>, ParseError> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
            .and_then(|d| d.and_hms_opt(self.hour, self.minute, 0))
            .map(|dt| dt.and_utc())
            .ok_or(ParseError::InvalidDateTime {
                year: self.year,
                month: self.month,
                day: self.day,
                hour: self.hour,
                minute: self.minute,
            })
    }
}
