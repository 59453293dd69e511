// File: ./src/model/entry.rs
//! Calendar event representation, shaped like a Google Calendar v3 event resource.
use crate::error::ParseError;
use crate::model::job::JobRecord;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Timestamps carry no offset; the zone label travels in a separate field.
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:00";

/// Private extended property holding the source post id.
pub const SOURCE_ID_PROPERTY: &str = "redditPost";
/// Shared extended property marking events owned by this bot.
pub const CREATED_BY_PROPERTY: &str = "createdBy";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    #[serde(default)]
    pub date_time: String,
    #[serde(default)]
    pub time_zone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedProperties {
    #[serde(default)]
    pub private: HashMap<String, String>,
    #[serde(default)]
    pub shared: HashMap<String, String>,
}

/// An event as stored in (or sent to) the remote calendar.
///
/// `id` is assigned by the store and absent from insert payloads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub start: EventTime,
    #[serde(default)]
    pub end: EventTime,
    #[serde(default)]
    pub extended_properties: ExtendedProperties,
}

/// Per-calendar constants that go into every entry.
#[derive(Debug, Clone)]
pub struct EntrySettings {
    pub subreddit: String,
    pub creator: String,
    pub duration: Duration,
}

impl CalendarEntry {
    /// Builds the full payload for a job. Fails if the job's date is not a real instant.
    pub fn for_job(job: &JobRecord, settings: &EntrySettings) -> Result<Self, ParseError> {
        let start = job.start_instant()?;
        let end = start
            .checked_add_signed(settings.duration)
            .ok_or_else(|| ParseError::EndOutOfRange {
                start: start.format(DATE_TIME_FORMAT).to_string(),
                hours: settings.duration.num_hours(),
            })?;

        let mut private = HashMap::new();
        private.insert(SOURCE_ID_PROPERTY.to_string(), job.external_id.clone());
        let mut shared = HashMap::new();
        shared.insert(CREATED_BY_PROPERTY.to_string(), settings.creator.clone());

        Ok(Self {
            id: None,
            summary: format!("[{}] {}", job.flair().to_uppercase(), job.display_name()),
            location: Some(format!("https://reddit.com/r/{}", settings.subreddit)),
            description: format!("https://reddit.com{} by {}", job.permalink, job.author),
            start: EventTime {
                date_time: start.format(DATE_TIME_FORMAT).to_string(),
                time_zone: job.timezone_label.clone(),
            },
            end: EventTime {
                date_time: end.format(DATE_TIME_FORMAT).to_string(),
                time_zone: job.timezone_label.clone(),
            },
            extended_properties: ExtendedProperties { private, shared },
        })
    }

    /// The source post id stored on this entry, if any.
    pub fn external_id(&self) -> Option<&str> {
        self.extended_properties
            .private
            .get(SOURCE_ID_PROPERTY)
            .map(String::as_str)
    }

    /// Whether the stored entry no longer reflects the job starting at `start`.
    ///
    /// Containment rather than equality: the calendar is free to decorate the
    /// stored values (e.g. append `Z` to timestamps) without triggering updates.
    pub fn needs_update(&self, job: &JobRecord, start: DateTime<Utc>) -> bool {
        let start = start.format(DATE_TIME_FORMAT).to_string();
        !self.summary.contains(&job.flair().to_uppercase())
            || !self.start.date_time.contains(&start)
            || !self.start.time_zone.contains(&job.timezone_label)
    }
}
