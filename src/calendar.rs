// File: ./src/calendar.rs
//! The calendar side: the remote store of events keyed by source post id.
use crate::error::StoreError;
use crate::model::CalendarEntry;
use chrono::{DateTime, Utc};

#[allow(async_fn_in_trait)]
pub trait CalendarStore {
    /// All entries whose private source id equals `external_id`, in store order.
    async fn find_by_external_id(&self, external_id: &str)
    -> Result<Vec<CalendarEntry>, StoreError>;

    async fn insert(&self, payload: &CalendarEntry) -> Result<CalendarEntry, StoreError>;

    async fn update(
        &self,
        entry_id: &str,
        payload: &CalendarEntry,
    ) -> Result<CalendarEntry, StoreError>;

    async fn delete(&self, entry_id: &str) -> Result<(), StoreError>;

    /// Entries starting at or after `from`, earliest first.
    async fn list_future(
        &self,
        from: DateTime<Utc>,
        max_results: usize,
    ) -> Result<Vec<CalendarEntry>, StoreError>;
}
