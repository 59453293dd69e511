// File: ./src/engine.rs
//! Reconciliation of feed posts against the calendar.
//!
//! One pass reads a window of recent posts, and for each one decides whether the
//! calendar needs a new event, an update, or nothing at all; the author is then
//! told about the outcome. A separate sweep deletes future events whose post has
//! been removed. Both halves are safe to re-run: an unchanged post produces no
//! calendar writes.
use crate::calendar::CalendarStore;
use crate::error::{FeedError, ParseError, PassError, StoreError};
use crate::feed::SourceFeed;
use crate::model::{CalendarEntry, EntrySettings, JobRecord, SourcePost};
use crate::notify::{self, NoticeContext};
use crate::observer::{Observer, SyncEvent};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Account the notices are posted from; used to find earlier notices.
    pub identity: String,
    pub fetch_limit: usize,
    /// Posts whose flair contains one of these (case-insensitive) are ignored.
    pub skip_flairs: Vec<String>,
    pub sweep_max_results: usize,
    pub entry: EntrySettings,
    pub notices: NoticeContext,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Created,
    Updated,
    Unchanged,
}

/// Terminal state of one post in a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Skipped,
    ParseFailed(ParseError),
    Synced {
        action: SyncAction,
        start: DateTime<Utc>,
    },
    StoreFailed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub parse_failed: usize,
    pub store_failed: usize,
}

impl PassReport {
    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Skipped => self.skipped += 1,
            Outcome::ParseFailed(_) => self.parse_failed += 1,
            Outcome::StoreFailed(_) => self.store_failed += 1,
            Outcome::Synced { action, .. } => match action {
                SyncAction::Created => self.created += 1,
                SyncAction::Updated => self.updated += 1,
                SyncAction::Unchanged => self.unchanged += 1,
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub examined: usize,
    pub deleted: usize,
    pub kept: usize,
    pub failed: usize,
}

pub struct Reconciler<F, C, O> {
    feed: F,
    store: C,
    observer: O,
    settings: EngineSettings,
}

impl<F: SourceFeed, C: CalendarStore, O: Observer> Reconciler<F, C, O> {
    pub fn new(feed: F, store: C, observer: O, settings: EngineSettings) -> Self {
        Self {
            feed,
            store,
            observer,
            settings,
        }
    }

    pub fn feed(&self) -> &F {
        &self.feed
    }

    pub fn store(&self) -> &C {
        &self.store
    }

    /// The skip marker a post's flair matches, if any.
    pub fn skip_marker(&self, post: &SourcePost) -> Option<&str> {
        let flair = post.flair.as_deref()?.to_uppercase();
        self.settings
            .skip_flairs
            .iter()
            .find(|marker| flair.contains(&marker.to_uppercase()))
            .map(String::as_str)
    }

    /// Full pass: every recent post in feed order, then the orphan sweep.
    pub async fn run_pass(&self, now: DateTime<Utc>) -> Result<(PassReport, SweepReport), PassError> {
        let report = self.process_feed().await?;
        let sweep = self.sweep_orphans(now).await?;
        Ok((report, sweep))
    }

    /// Reconciles and notifies each recent post. Only a failure to read the feed aborts.
    pub async fn process_feed(&self) -> Result<PassReport, FeedError> {
        let limit = self.settings.fetch_limit;
        self.observer.on_event(SyncEvent::PassStarted { limit });

        let posts = self.feed.list_recent(limit).await?;
        let mut report = PassReport::default();
        for post in &posts {
            let outcome = self.process_post(post).await;
            report.record(&outcome);
        }
        Ok(report)
    }

    /// Reconciles one post and tells its author how it went.
    pub async fn process_post(&self, post: &SourcePost) -> Outcome {
        let outcome = self.reconcile(post).await;
        self.notify(post, &outcome).await;
        outcome
    }

    /// Brings the calendar in line with one post, without notifying anyone.
    pub async fn reconcile(&self, post: &SourcePost) -> Outcome {
        if let Some(marker) = self.skip_marker(post) {
            self.observer.on_event(SyncEvent::Skipped {
                post_id: post.id.clone(),
                title: post.title.clone(),
                flair: marker.to_string(),
            });
            return Outcome::Skipped;
        }

        let parsed = JobRecord::from_post(post).and_then(|job| {
            let start = job.start_instant()?;
            let payload = CalendarEntry::for_job(&job, &self.settings.entry)?;
            Ok((job, start, payload))
        });
        let (job, start, payload) = match parsed {
            Ok(parsed) => parsed,
            Err(e) => {
                self.observer.on_event(SyncEvent::ParseFailed {
                    post_id: post.id.clone(),
                    title: post.title.clone(),
                    error: e.to_string(),
                });
                return Outcome::ParseFailed(e);
            }
        };
        self.observer.on_event(SyncEvent::Parsed {
            post_id: job.external_id.clone(),
            name: job.display_name(),
            start: start.to_rfc3339(),
            timezone: job.timezone_label.clone(),
        });

        match self.upsert_entry(&job, start, &payload).await {
            Ok(action) => Outcome::Synced { action, start },
            Err(e) => {
                self.observer.on_event(SyncEvent::StoreFailed {
                    post_id: job.external_id.clone(),
                    error: e.to_string(),
                });
                Outcome::StoreFailed(e.to_string())
            }
        }
    }

    async fn upsert_entry(
        &self,
        job: &JobRecord,
        start: DateTime<Utc>,
        payload: &CalendarEntry,
    ) -> Result<SyncAction, StoreError> {
        let existing = self.store.find_by_external_id(&job.external_id).await?;
        if existing.len() > 1 {
            self.observer.on_event(SyncEvent::DuplicateEntries {
                post_id: job.external_id.clone(),
                count: existing.len(),
            });
        }

        let Some(entry) = existing.into_iter().next() else {
            let created = self.store.insert(payload).await?;
            self.observer.on_event(SyncEvent::Created {
                post_id: job.external_id.clone(),
                entry_id: created.id,
            });
            return Ok(SyncAction::Created);
        };

        let entry_id = entry
            .id
            .clone()
            .ok_or_else(|| StoreError::Rejected("calendar returned an event without an id".into()))?;

        if entry.needs_update(job, start) {
            self.store.update(&entry_id, payload).await?;
            self.observer.on_event(SyncEvent::Updated {
                post_id: job.external_id.clone(),
                entry_id,
            });
            Ok(SyncAction::Updated)
        } else {
            self.observer.on_event(SyncEvent::Unchanged {
                post_id: job.external_id.clone(),
                entry_id,
            });
            Ok(SyncAction::Unchanged)
        }
    }

    /// Posts (or refreshes) the bot's notice under the post. Failures are reported, not raised.
    pub async fn notify(&self, post: &SourcePost, outcome: &Outcome) {
        let ctx = &self.settings.notices;
        let text = match outcome {
            Outcome::Skipped => return,
            Outcome::ParseFailed(_) => notify::parse_failure_notice(ctx, &post.author),
            Outcome::StoreFailed(message) => {
                notify::store_failure_notice(ctx, &post.author, message)
            }
            Outcome::Synced { start, .. } => notify::success_notice(ctx, *start),
        };

        if let Err(e) = self.upsert_reply(post, &text).await {
            self.observer.on_event(SyncEvent::NotifyFailed {
                post_id: post.id.clone(),
                error: e.to_string(),
            });
        }
    }

    async fn upsert_reply(&self, post: &SourcePost, text: &str) -> Result<(), FeedError> {
        match self
            .feed
            .post_has_reply_from(post, &self.settings.identity)
            .await?
        {
            Some(reply) if reply.body == text => {
                self.observer.on_event(SyncEvent::ReplyUnchanged {
                    post_id: post.id.clone(),
                });
            }
            Some(reply) => {
                self.feed.edit_reply(&reply, text).await?;
                self.observer.on_event(SyncEvent::ReplyEdited {
                    post_id: post.id.clone(),
                    reply_id: reply.id,
                });
            }
            None => {
                self.feed.submit_reply(post, text).await?;
                self.observer.on_event(SyncEvent::ReplySubmitted {
                    post_id: post.id.clone(),
                });
            }
        }
        Ok(())
    }

    /// Deletes future events whose source post has been removed.
    ///
    /// Works purely from calendar state plus one removal lookup per post id.
    /// Every event sharing a removed id is deleted, which also collapses duplicates.
    /// Per-event failures are reported and skipped; only listing the calendar can abort.
    pub async fn sweep_orphans(&self, now: DateTime<Utc>) -> Result<SweepReport, StoreError> {
        let entries = self
            .store
            .list_future(now, self.settings.sweep_max_results)
            .await?;
        self.observer.on_event(SyncEvent::SweepStarted {
            from: now.to_rfc3339(),
            found: entries.len(),
        });

        let mut report = SweepReport::default();
        let mut seen = HashSet::new();
        for entry in &entries {
            report.examined += 1;
            let Some(post_id) = entry.external_id() else {
                self.observer.on_event(SyncEvent::UnlinkedEntry {
                    entry_id: entry.id.clone(),
                    summary: entry.summary.clone(),
                });
                continue;
            };
            if !seen.insert(post_id.to_string()) {
                continue;
            }

            match self.feed.get_removal_status(post_id).await {
                Ok(None) => {
                    report.kept += 1;
                    self.observer.on_event(SyncEvent::OrphanKept {
                        post_id: post_id.to_string(),
                    });
                }
                Ok(Some(reason)) => match self.delete_all(post_id, &reason).await {
                    Ok(deleted) => report.deleted += deleted,
                    Err(e) => {
                        report.failed += 1;
                        self.observer.on_event(SyncEvent::SweepFailed {
                            post_id: post_id.to_string(),
                            error: e.to_string(),
                        });
                    }
                },
                Err(e) => {
                    report.failed += 1;
                    self.observer.on_event(SyncEvent::SweepFailed {
                        post_id: post_id.to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }
        Ok(report)
    }

    async fn delete_all(&self, post_id: &str, reason: &str) -> Result<usize, StoreError> {
        let mut deleted = 0;
        for entry in self.store.find_by_external_id(post_id).await? {
            let Some(entry_id) = entry.id else {
                continue;
            };
            self.store.delete(&entry_id).await?;
            deleted += 1;
            self.observer.on_event(SyncEvent::OrphanDeleted {
                post_id: post_id.to_string(),
                entry_id,
                reason: reason.to_string(),
            });
        }
        Ok(deleted)
    }
}
