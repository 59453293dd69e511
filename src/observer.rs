// File: ./src/observer.rs
//! Structured reporting of what a reconciliation pass did.
//!
//! The engine never logs directly; it hands every transition to an `Observer`
//! supplied by the caller. `LogObserver` forwards to the `log` facade,
//! `RecordingObserver` keeps events in memory for inspection.
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    PassStarted {
        limit: usize,
    },
    Skipped {
        post_id: String,
        title: String,
        flair: String,
    },
    ParseFailed {
        post_id: String,
        title: String,
        error: String,
    },
    Parsed {
        post_id: String,
        name: String,
        start: String,
        timezone: String,
    },
    DuplicateEntries {
        post_id: String,
        count: usize,
    },
    Created {
        post_id: String,
        entry_id: Option<String>,
    },
    Updated {
        post_id: String,
        entry_id: String,
    },
    Unchanged {
        post_id: String,
        entry_id: String,
    },
    StoreFailed {
        post_id: String,
        error: String,
    },
    ReplySubmitted {
        post_id: String,
    },
    ReplyEdited {
        post_id: String,
        reply_id: String,
    },
    ReplyUnchanged {
        post_id: String,
    },
    NotifyFailed {
        post_id: String,
        error: String,
    },
    SweepStarted {
        from: String,
        found: usize,
    },
    UnlinkedEntry {
        entry_id: Option<String>,
        summary: String,
    },
    OrphanDeleted {
        post_id: String,
        entry_id: String,
        reason: String,
    },
    OrphanKept {
        post_id: String,
    },
    SweepFailed {
        post_id: String,
        error: String,
    },
}

pub trait Observer {
    fn on_event(&self, event: SyncEvent);
}

impl<T: Observer + ?Sized> Observer for &T {
    fn on_event(&self, event: SyncEvent) {
        (**self).on_event(event)
    }
}

/// Forwards events to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl Observer for LogObserver {
    fn on_event(&self, event: SyncEvent) {
        match event {
            SyncEvent::PassStarted { limit } => {
                log::info!("Reading up to {} recent posts", limit)
            }
            SyncEvent::Skipped {
                title, flair, ..
            } => log::info!("Skipping {}-flaired post: {}", flair, title),
            SyncEvent::ParseFailed {
                post_id,
                title,
                error,
            } => log::error!("Unable to parse post {} ('{}'): {}", post_id, title, error),
            SyncEvent::Parsed {
                post_id,
                name,
                start,
                timezone,
            } => log::debug!("Parsed post {}: '{}' at {} {}", post_id, name, start, timezone),
            SyncEvent::DuplicateEntries { post_id, count } => log::warn!(
                "{} calendar events found for post {}; using the first",
                count,
                post_id
            ),
            SyncEvent::Created { post_id, entry_id } => log::info!(
                "Created event {} for post {}",
                entry_id.as_deref().unwrap_or("?"),
                post_id
            ),
            SyncEvent::Updated { post_id, entry_id } => {
                log::info!("Updated event {} for post {}", entry_id, post_id)
            }
            SyncEvent::Unchanged { post_id, entry_id } => log::info!(
                "Event {} for post {} is current, skipping update",
                entry_id,
                post_id
            ),
            SyncEvent::StoreFailed { post_id, error } => {
                log::error!("Calendar error for post {}: {}", post_id, error)
            }
            SyncEvent::ReplySubmitted { post_id } => log::info!("Commented on post {}", post_id),
            SyncEvent::ReplyEdited { post_id, reply_id } => {
                log::info!("Edited comment {} on post {}", reply_id, post_id)
            }
            SyncEvent::ReplyUnchanged { post_id } => {
                log::debug!("No change to comment on post {}", post_id)
            }
            SyncEvent::NotifyFailed { post_id, error } => {
                log::warn!("Could not comment on post {}: {}", post_id, error)
            }
            SyncEvent::SweepStarted { from, found } => {
                log::info!("Event cleanup from {}: {} future events", from, found)
            }
            SyncEvent::UnlinkedEntry { entry_id, summary } => log::warn!(
                "Event {} ('{}') carries no source post id, leaving it alone",
                entry_id.as_deref().unwrap_or("?"),
                summary
            ),
            SyncEvent::OrphanDeleted {
                post_id,
                entry_id,
                reason,
            } => log::info!(
                "Post {} removed ({}), deleted event {}",
                post_id,
                reason,
                entry_id
            ),
            SyncEvent::OrphanKept { post_id } => {
                log::debug!("Post {} not removed, no action taken", post_id)
            }
            SyncEvent::SweepFailed { post_id, error } => {
                log::error!("Cleanup failed for post {}: {}", post_id, error)
            }
        }
    }
}

/// Keeps every event, in order. Handy in tests and dry runs.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<SyncEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SyncEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl Observer for RecordingObserver {
    fn on_event(&self, event: SyncEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}
