// Integration tests for deleting calendar entries whose post was removed.
mod common;

use chrono::{TimeZone, Utc};
use common::{BOT, now, post, settings};
use jobcal::engine::{Reconciler, SweepReport};
use jobcal::memory::{MemoryCalendar, MemoryFeed};
use jobcal::model::{CalendarEntry, EventTime, JobRecord};
use jobcal::observer::{RecordingObserver, SyncEvent};

fn entry_for(id: &str, title: &str) -> CalendarEntry {
    let job = JobRecord::from_post(&post(id, title, Some("Job Open"))).unwrap();
    CalendarEntry::for_job(&job, &settings().entry).unwrap()
}

#[tokio::test]
async fn test_removed_post_loses_every_entry() {
    let store = MemoryCalendar::new();
    store.seed(entry_for("gone", "Heist 2030-05-01 2000 UTC"));
    store.seed(entry_for("gone", "Heist 2030-05-01 2000 UTC"));
    store.seed(entry_for("live", "Cargo 2030-06-01 2000 UTC"));

    let feed = MemoryFeed::new(BOT, vec![post("live", "Cargo 2030-06-01 2000 UTC", None)]);
    feed.remove_post("gone", "moderator");

    let recorder = RecordingObserver::new();
    let engine = Reconciler::new(feed, store, &recorder, settings());
    let report = engine.sweep_orphans(now()).await.unwrap();

    assert_eq!(
        report,
        SweepReport {
            examined: 3,
            deleted: 2,
            kept: 1,
            failed: 0,
        }
    );
    let remaining = engine.store().entries();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].external_id(), Some("live"));

    let deleted: Vec<_> = recorder
        .events()
        .into_iter()
        .filter_map(|e| match e {
            SyncEvent::OrphanDeleted { reason, .. } => Some(reason),
            _ => None,
        })
        .collect();
    assert_eq!(deleted, vec!["moderator".to_string(), "moderator".to_string()]);
}

#[tokio::test]
async fn test_live_posts_are_left_alone() {
    let store = MemoryCalendar::new();
    store.seed(entry_for("live", "Cargo 2030-06-01 2000 UTC"));
    let engine = Reconciler::new(
        MemoryFeed::new(BOT, vec![post("live", "Cargo 2030-06-01 2000 UTC", None)]),
        store,
        RecordingObserver::new(),
        settings(),
    );

    let report = engine.sweep_orphans(now()).await.unwrap();
    assert_eq!(report.kept, 1);
    assert_eq!(engine.store().mutations(), 0);
}

#[tokio::test]
async fn test_past_entries_are_outside_the_window() {
    let store = MemoryCalendar::new();
    store.seed(entry_for("old", "Heist 2020-05-01 2000 UTC"));
    let feed = MemoryFeed::new(BOT, vec![]);
    feed.remove_post("old", "deleted");
    let engine = Reconciler::new(feed, store, RecordingObserver::new(), settings());

    let report = engine.sweep_orphans(now()).await.unwrap();
    assert_eq!(report.examined, 0);
    assert_eq!(engine.store().entries().len(), 1);
}

#[tokio::test]
async fn test_unlinked_entries_are_reported_not_deleted() {
    let store = MemoryCalendar::new();
    store.seed(CalendarEntry {
        summary: "Hand-made event".to_string(),
        start: EventTime {
            date_time: "2030-01-01T10:00:00Z".to_string(),
            time_zone: "UTC".to_string(),
        },
        ..Default::default()
    });
    let recorder = RecordingObserver::new();
    let engine = Reconciler::new(MemoryFeed::new(BOT, vec![]), store, &recorder, settings());

    let report = engine.sweep_orphans(now()).await.unwrap();
    assert_eq!(report.examined, 1);
    assert_eq!(report.deleted, 0);
    assert_eq!(engine.store().entries().len(), 1);
    assert!(recorder.events().contains(&SyncEvent::UnlinkedEntry {
        entry_id: Some("evt1".to_string()),
        summary: "Hand-made event".to_string(),
    }));
}

#[tokio::test]
async fn test_failed_lookup_does_not_stop_the_sweep() {
    let store = MemoryCalendar::new();
    store.seed(entry_for("flaky", "Heist 2030-05-01 2000 UTC"));
    store.seed(entry_for("gone", "Cargo 2030-06-01 2000 UTC"));
    let feed = MemoryFeed::new(BOT, vec![]);
    feed.fail_post("flaky", Some("timeout"));
    feed.remove_post("gone", "moderator");

    let recorder = RecordingObserver::new();
    let engine = Reconciler::new(feed, store, &recorder, settings());
    let report = engine.sweep_orphans(now()).await.unwrap();

    assert_eq!(report.failed, 1);
    assert_eq!(report.deleted, 1);
    let remaining = engine.store().entries();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].external_id(), Some("flaky"));
    assert!(recorder.events().contains(&SyncEvent::SweepFailed {
        post_id: "flaky".to_string(),
        error: "Feed rejected the request: timeout".to_string(),
    }));
}

#[tokio::test]
async fn test_calendar_outage_aborts_sweep() {
    let store = MemoryCalendar::new();
    store.seed(entry_for("live", "Cargo 2030-06-01 2000 UTC"));
    store.fail_with(Some("backend error"));
    let engine = Reconciler::new(
        MemoryFeed::new(BOT, vec![]),
        store,
        RecordingObserver::new(),
        settings(),
    );
    assert!(engine.sweep_orphans(now()).await.is_err());
}

#[tokio::test]
async fn test_full_pass_sweeps_after_processing() {
    let feed = MemoryFeed::new(
        BOT,
        vec![
            post("a", "Heist 2030-05-01 2000 UTC", Some("Job Open")),
            post("b", "Cargo 2030-06-01 2000 UTC", Some("Job Open")),
        ],
    );
    let engine = Reconciler::new(
        feed,
        MemoryCalendar::new(),
        RecordingObserver::new(),
        settings(),
    );
    let (report, sweep) = engine.run_pass(now()).await.unwrap();
    assert_eq!(report.created, 2);
    assert_eq!(sweep.kept, 2);

    engine.feed().remove_post("b", "author");
    let later = Utc.with_ymd_and_hms(2029, 1, 1, 0, 0, 0).unwrap();
    let (report, sweep) = engine.run_pass(later).await.unwrap();
    assert_eq!(report.unchanged, 1);
    assert_eq!(sweep.deleted, 1);
    let entries = engine.store().entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].external_id(), Some("a"));
}
