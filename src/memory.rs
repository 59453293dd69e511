// File: ./src/memory.rs
//! In-process implementations of the feed and calendar collaborators.
//!
//! They behave like the remote services closely enough to exercise the engine
//! (store-assigned ids, duplicate entries, removal status) and count every write
//! so idempotence can be checked.
use crate::calendar::CalendarStore;
use crate::error::{FeedError, StoreError};
use crate::feed::{Reply, SourceFeed};
use crate::model::entry::DATE_TIME_FORMAT;
use crate::model::{CalendarEntry, SourcePost};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn parse_stored_time(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim_end_matches('Z');
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, DATE_TIME_FORMAT))
        .ok()
        .map(|dt| dt.and_utc())
}

// The remote calendar echoes UTC times back with a zone suffix.
fn as_stored(payload: &CalendarEntry, id: String) -> CalendarEntry {
    let mut entry = payload.clone();
    entry.id = Some(id);
    if entry.start.time_zone == "UTC" && !entry.start.date_time.ends_with('Z') {
        entry.start.date_time.push('Z');
        entry.end.date_time.push('Z');
    }
    entry
}

#[derive(Debug, Default)]
struct CalendarState {
    entries: Vec<CalendarEntry>,
    next_id: u64,
    mutations: usize,
    fail_with: Option<String>,
}

/// A calendar kept in a `Vec`, in insertion order.
#[derive(Debug, Default)]
pub struct MemoryCalendar {
    state: Mutex<CalendarState>,
}

impl MemoryCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an entry verbatim, assigning an id if it has none. Not counted as a mutation.
    pub fn seed(&self, mut entry: CalendarEntry) -> String {
        let mut state = lock(&self.state);
        state.next_id += 1;
        let id = entry
            .id
            .get_or_insert_with(|| format!("evt{}", state.next_id))
            .clone();
        state.entries.push(entry);
        id
    }

    pub fn entries(&self) -> Vec<CalendarEntry> {
        lock(&self.state).entries.clone()
    }

    /// Number of insert/update/delete calls that succeeded.
    pub fn mutations(&self) -> usize {
        lock(&self.state).mutations
    }

    /// Makes every subsequent call fail with `message` until cleared with `None`.
    pub fn fail_with(&self, message: Option<&str>) {
        lock(&self.state).fail_with = message.map(str::to_string);
    }

    fn check(state: &CalendarState) -> Result<(), StoreError> {
        match &state.fail_with {
            Some(message) => Err(StoreError::Rejected(message.clone())),
            None => Ok(()),
        }
    }
}

impl CalendarStore for MemoryCalendar {
    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Vec<CalendarEntry>, StoreError> {
        let state = lock(&self.state);
        Self::check(&state)?;
        Ok(state
            .entries
            .iter()
            .filter(|e| e.external_id() == Some(external_id))
            .cloned()
            .collect())
    }

    async fn insert(&self, payload: &CalendarEntry) -> Result<CalendarEntry, StoreError> {
        let mut state = lock(&self.state);
        Self::check(&state)?;
        state.next_id += 1;
        let entry = as_stored(payload, format!("evt{}", state.next_id));
        state.entries.push(entry.clone());
        state.mutations += 1;
        Ok(entry)
    }

    async fn update(
        &self,
        entry_id: &str,
        payload: &CalendarEntry,
    ) -> Result<CalendarEntry, StoreError> {
        let mut state = lock(&self.state);
        Self::check(&state)?;
        let slot = state
            .entries
            .iter_mut()
            .find(|e| e.id.as_deref() == Some(entry_id))
            .ok_or_else(|| StoreError::Status {
                status: 404,
                body: format!("event {} not found", entry_id),
            })?;
        let entry = as_stored(payload, entry_id.to_string());
        *slot = entry.clone();
        state.mutations += 1;
        Ok(entry)
    }

    async fn delete(&self, entry_id: &str) -> Result<(), StoreError> {
        let mut state = lock(&self.state);
        Self::check(&state)?;
        let before = state.entries.len();
        state.entries.retain(|e| e.id.as_deref() != Some(entry_id));
        if state.entries.len() == before {
            return Err(StoreError::Status {
                status: 410,
                body: format!("event {} already deleted", entry_id),
            });
        }
        state.mutations += 1;
        Ok(())
    }

    async fn list_future(
        &self,
        from: DateTime<Utc>,
        max_results: usize,
    ) -> Result<Vec<CalendarEntry>, StoreError> {
        let state = lock(&self.state);
        Self::check(&state)?;
        let mut upcoming: Vec<(DateTime<Utc>, CalendarEntry)> = state
            .entries
            .iter()
            .filter_map(|e| parse_stored_time(&e.start.date_time).map(|t| (t, e.clone())))
            .filter(|(t, _)| *t >= from)
            .collect();
        upcoming.sort_by_key(|(t, _)| *t);
        Ok(upcoming
            .into_iter()
            .take(max_results)
            .map(|(_, e)| e)
            .collect())
    }
}

#[derive(Debug, Default)]
struct FeedState {
    posts: Vec<SourcePost>,
    replies: Vec<Reply>,
    removed: HashMap<String, String>,
    next_reply: u64,
    fail_with: Option<String>,
    failing_posts: HashMap<String, String>,
}

/// A feed holding posts newest-first, plus replies and removal reasons.
///
/// Replies submitted through the trait are authored by `identity`.
#[derive(Debug, Default)]
pub struct MemoryFeed {
    identity: String,
    state: Mutex<FeedState>,
}

impl MemoryFeed {
    pub fn new(identity: &str, posts: Vec<SourcePost>) -> Self {
        Self {
            identity: identity.to_string(),
            state: Mutex::new(FeedState {
                posts,
                ..Default::default()
            }),
        }
    }

    pub fn push_post(&self, post: SourcePost) {
        lock(&self.state).posts.insert(0, post);
    }

    /// Replaces a post in place (e.g. after its flair or body was edited).
    pub fn replace_post(&self, post: SourcePost) {
        let mut state = lock(&self.state);
        if let Some(slot) = state.posts.iter_mut().find(|p| p.id == post.id) {
            *slot = post;
        }
    }

    pub fn remove_post(&self, post_id: &str, reason: &str) {
        let mut state = lock(&self.state);
        state.posts.retain(|p| p.id != post_id);
        state
            .removed
            .insert(post_id.to_string(), reason.to_string());
    }

    pub fn add_reply(&self, post_id: &str, author: &str, body: &str) {
        let mut state = lock(&self.state);
        state.next_reply += 1;
        let id = format!("c{}", state.next_reply);
        state.replies.push(Reply {
            id,
            post_id: post_id.to_string(),
            author: author.to_string(),
            body: body.to_string(),
        });
    }

    pub fn replies(&self) -> Vec<Reply> {
        lock(&self.state).replies.clone()
    }

    pub fn fail_with(&self, message: Option<&str>) {
        lock(&self.state).fail_with = message.map(str::to_string);
    }

    /// Makes calls scoped to one post (replies, removal status) fail with `message`
    /// until cleared with `None`. Listing is unaffected.
    pub fn fail_post(&self, post_id: &str, message: Option<&str>) {
        let mut state = lock(&self.state);
        match message {
            Some(message) => state
                .failing_posts
                .insert(post_id.to_string(), message.to_string()),
            None => state.failing_posts.remove(post_id),
        };
    }

    fn check(state: &FeedState) -> Result<(), FeedError> {
        match &state.fail_with {
            Some(message) => Err(FeedError::Rejected(message.clone())),
            None => Ok(()),
        }
    }

    fn check_post(state: &FeedState, post_id: &str) -> Result<(), FeedError> {
        Self::check(state)?;
        match state.failing_posts.get(post_id) {
            Some(message) => Err(FeedError::Rejected(message.clone())),
            None => Ok(()),
        }
    }
}

impl SourceFeed for MemoryFeed {
    async fn list_recent(&self, limit: usize) -> Result<Vec<SourcePost>, FeedError> {
        let state = lock(&self.state);
        Self::check(&state)?;
        Ok(state.posts.iter().take(limit).cloned().collect())
    }

    async fn post_has_reply_from(
        &self,
        post: &SourcePost,
        identity: &str,
    ) -> Result<Option<Reply>, FeedError> {
        let state = lock(&self.state);
        Self::check_post(&state, &post.id)?;
        Ok(state
            .replies
            .iter()
            .find(|r| r.post_id == post.id && r.author == identity)
            .cloned())
    }

    async fn submit_reply(&self, post: &SourcePost, text: &str) -> Result<(), FeedError> {
        {
            let state = lock(&self.state);
            Self::check_post(&state, &post.id)?;
        }
        self.add_reply(&post.id, &self.identity, text);
        Ok(())
    }

    async fn edit_reply(&self, reply: &Reply, text: &str) -> Result<(), FeedError> {
        let mut state = lock(&self.state);
        Self::check_post(&state, &reply.post_id)?;
        let slot = state
            .replies
            .iter_mut()
            .find(|r| r.id == reply.id)
            .ok_or_else(|| FeedError::Rejected(format!("reply {} not found", reply.id)))?;
        slot.body = text.to_string();
        Ok(())
    }

    async fn get_removal_status(&self, external_id: &str) -> Result<Option<String>, FeedError> {
        let state = lock(&self.state);
        Self::check_post(&state, external_id)?;
        Ok(state.removed.get(external_id).cloned())
    }
}
