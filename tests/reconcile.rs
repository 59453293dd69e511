// Integration tests for the per-post reconciliation pass.
mod common;

use chrono::{TimeZone, Utc};
use common::{BOT, post, settings};
use jobcal::engine::{Outcome, PassReport, Reconciler, SyncAction};
use jobcal::error::ParseError;
use jobcal::memory::{MemoryCalendar, MemoryFeed};
use jobcal::model::{CalendarEntry, JobRecord};
use jobcal::observer::{RecordingObserver, SyncEvent};

const HEIST: &str = "[Arc] Heist 2030-05-01 2000 UTC";

#[tokio::test]
async fn test_new_post_creates_entry_and_notifies_author() {
    let feed = MemoryFeed::new(BOT, vec![post("p1", HEIST, Some("Job Open"))]);
    let recorder = RecordingObserver::new();
    let engine = Reconciler::new(feed, MemoryCalendar::new(), &recorder, settings());

    let report = engine.process_feed().await.unwrap();
    assert_eq!(
        report,
        PassReport {
            created: 1,
            ..Default::default()
        }
    );

    let entries = engine.store().entries();
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.summary, "[JOB OPEN] [Arc] Heist");
    assert_eq!(entry.start.date_time, "2030-05-01T20:00:00Z");
    assert_eq!(entry.end.date_time, "2030-05-01T23:00:00Z");
    assert_eq!(entry.start.time_zone, "UTC");
    assert_eq!(
        entry.location.as_deref(),
        Some("https://reddit.com/r/NeonAnarchy")
    );
    assert_eq!(
        entry.description,
        "https://reddit.com/r/NeonAnarchy/comments/p1/ by fredbear"
    );
    assert_eq!(entry.external_id(), Some("p1"));
    assert_eq!(
        entry.extended_properties.shared.get("createdBy").map(String::as_str),
        Some("calendarbot")
    );

    let replies = engine.feed().replies();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].author, BOT);
    let ts = Utc
        .with_ymd_and_hms(2030, 5, 1, 20, 0, 0)
        .unwrap()
        .timestamp();
    assert!(replies[0].body.contains(&format!("<t:{}:F>", ts)));
    assert!(replies[0].body.contains(&format!("<t:{}:R>", ts)));

    assert!(
        recorder
            .events()
            .contains(&SyncEvent::ReplySubmitted {
                post_id: "p1".to_string()
            })
    );
}

#[tokio::test]
async fn test_second_pass_writes_nothing() {
    let feed = MemoryFeed::new(
        BOT,
        vec![
            post("p1", HEIST, Some("Job Open")),
            post("p2", "Red Hot Cargo 21-08-2031 14:00 UTC", None),
        ],
    );
    let recorder = RecordingObserver::new();
    let engine = Reconciler::new(feed, MemoryCalendar::new(), &recorder, settings());

    let first = engine.process_feed().await.unwrap();
    assert_eq!(first.created, 2);
    let mutations = engine.store().mutations();
    let replies = engine.feed().replies();

    let second = engine.process_feed().await.unwrap();
    assert_eq!(
        second,
        PassReport {
            unchanged: 2,
            ..Default::default()
        }
    );
    assert_eq!(engine.store().mutations(), mutations);
    assert_eq!(engine.store().entries().len(), 2);
    assert_eq!(engine.feed().replies(), replies);

    let unchanged_replies = recorder
        .events()
        .into_iter()
        .filter(|e| matches!(e, SyncEvent::ReplyUnchanged { .. }))
        .count();
    assert_eq!(unchanged_replies, 2);
}

#[tokio::test]
async fn test_flair_change_updates_entry_in_place() {
    let feed = MemoryFeed::new(BOT, vec![post("p1", HEIST, Some("Job Open"))]);
    let engine = Reconciler::new(
        feed,
        MemoryCalendar::new(),
        RecordingObserver::new(),
        settings(),
    );
    engine.process_feed().await.unwrap();
    let original_id = engine.store().entries()[0].id.clone();

    engine
        .feed()
        .replace_post(post("p1", HEIST, Some("Job Closed")));
    let report = engine.process_feed().await.unwrap();

    assert_eq!(report.updated, 1);
    let entries = engine.store().entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, original_id);
    assert_eq!(entries[0].summary, "[JOB CLOSED] [Arc] Heist");
    // Start unchanged, so the notice text is unchanged too.
    assert_eq!(engine.feed().replies().len(), 1);
}

#[tokio::test]
async fn test_hint_edit_moves_entry_and_edits_reply() {
    let mut p = post("p1", HEIST, Some("Job Open"));
    let recorder = RecordingObserver::new();
    let engine = Reconciler::new(
        MemoryFeed::new(BOT, vec![p.clone()]),
        MemoryCalendar::new(),
        &recorder,
        settings(),
    );
    engine.process_feed().await.unwrap();

    p.body = "Moved!\n{CALENDAR_HINT: [Arc] Heist 2030-05-02 1800 UTC}".to_string();
    engine.feed().replace_post(p);
    let report = engine.process_feed().await.unwrap();

    assert_eq!(report.updated, 1);
    let entries = engine.store().entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].start.date_time, "2030-05-02T18:00:00Z");

    let replies = engine.feed().replies();
    assert_eq!(replies.len(), 1);
    let ts = Utc
        .with_ymd_and_hms(2030, 5, 2, 18, 0, 0)
        .unwrap()
        .timestamp();
    assert!(replies[0].body.contains(&format!("<t:{}:F>", ts)));
    assert!(recorder.events().iter().any(|e| matches!(
        e,
        SyncEvent::ReplyEdited { post_id, .. } if post_id == "p1"
    )));
}

#[tokio::test]
async fn test_zone_only_hint_edit_updates_entry() {
    let mut p = post("p1", HEIST, Some("Job Open"));
    let engine = Reconciler::new(
        MemoryFeed::new(BOT, vec![p.clone()]),
        MemoryCalendar::new(),
        RecordingObserver::new(),
        settings(),
    );
    engine.process_feed().await.unwrap();

    p.body = "{CALENDAR_HINT: [Arc] Heist 2030-05-01 2000 Australia/Sydney}".to_string();
    engine.feed().replace_post(p);
    let report = engine.process_feed().await.unwrap();

    assert_eq!(report.updated, 1);
    let entries = engine.store().entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].start.date_time, "2030-05-01T20:00:00");
    assert_eq!(entries[0].start.time_zone, "Australia/Sydney");

    let report = engine.process_feed().await.unwrap();
    assert_eq!(report.unchanged, 1);
}

#[tokio::test]
async fn test_reply_failure_is_reported_and_pass_continues() {
    let feed = MemoryFeed::new(
        BOT,
        vec![
            post("p1", HEIST, Some("Job Open")),
            post("p2", "Red Hot Cargo 21-08-2031 14:00 UTC", None),
        ],
    );
    feed.fail_post("p1", Some("THREAD_LOCKED"));
    let recorder = RecordingObserver::new();
    let engine = Reconciler::new(feed, MemoryCalendar::new(), &recorder, settings());

    let report = engine.process_feed().await.unwrap();
    assert_eq!(report.created, 2);
    assert_eq!(engine.store().entries().len(), 2);

    let replies = engine.feed().replies();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].post_id, "p2");
    assert!(recorder.events().contains(&SyncEvent::NotifyFailed {
        post_id: "p1".to_string(),
        error: "Feed rejected the request: THREAD_LOCKED".to_string(),
    }));
}

#[tokio::test]
async fn test_skip_flair_is_case_insensitive_and_silent() {
    let feed = MemoryFeed::new(
        BOT,
        vec![post("m1", "Rules update 2030-01-01 1200 UTC", Some("Meta Discussion"))],
    );
    let engine = Reconciler::new(
        feed,
        MemoryCalendar::new(),
        RecordingObserver::new(),
        settings(),
    );

    let report = engine.process_feed().await.unwrap();
    assert_eq!(report.skipped, 1);
    assert!(engine.store().entries().is_empty());
    assert!(engine.feed().replies().is_empty());
}

#[tokio::test]
async fn test_unparsable_title_gets_help_notice() {
    let feed = MemoryFeed::new(BOT, vec![post("p9", "This is complete crap.", None)]);
    let engine = Reconciler::new(
        feed,
        MemoryCalendar::new(),
        RecordingObserver::new(),
        settings(),
    );

    let report = engine.process_feed().await.unwrap();
    assert_eq!(report.parse_failed, 1);
    assert!(engine.store().entries().is_empty());

    let replies = engine.feed().replies();
    assert_eq!(replies.len(), 1);
    assert!(replies[0].body.starts_with("Hi /u/fredbear!"));
    assert!(replies[0].body.contains("{CALENDAR_HINT:"));
}

#[tokio::test]
async fn test_impossible_date_is_a_parse_failure() {
    let engine = Reconciler::new(
        MemoryFeed::new(BOT, vec![]),
        MemoryCalendar::new(),
        RecordingObserver::new(),
        settings(),
    );
    let outcome = engine
        .reconcile(&post("p3", "The Prince of the West. 01-22-2022 @ 1800 UTC", None))
        .await;
    assert!(matches!(
        outcome,
        Outcome::ParseFailed(ParseError::InvalidDateTime { month: 22, .. })
    ));
    assert_eq!(engine.store().mutations(), 0);
}

#[tokio::test]
async fn test_store_failure_is_reported_and_pass_continues() {
    let feed = MemoryFeed::new(
        BOT,
        vec![
            post("p1", HEIST, Some("Job Open")),
            post("p2", "Red Hot Cargo 21-08-2031 14:00 UTC", None),
        ],
    );
    let recorder = RecordingObserver::new();
    let engine = Reconciler::new(feed, MemoryCalendar::new(), &recorder, settings());
    engine.store().fail_with(Some("quota exceeded"));

    let report = engine.process_feed().await.unwrap();
    assert_eq!(report.store_failed, 2);

    let replies = engine.feed().replies();
    assert_eq!(replies.len(), 2);
    for reply in &replies {
        assert!(
            reply
                .body
                .contains("The error message I got from Google was: Calendar rejected the request: quota exceeded")
        );
    }

    // Next pass recovers once the calendar is back.
    engine.store().fail_with(None);
    let report = engine.process_feed().await.unwrap();
    assert_eq!(report.created, 2);
    let edited = recorder
        .events()
        .into_iter()
        .filter(|e| matches!(e, SyncEvent::ReplyEdited { .. }))
        .count();
    assert_eq!(edited, 2);
}

#[tokio::test]
async fn test_duplicates_are_reported_and_first_entry_wins() {
    let p = post("p1", HEIST, Some("Job Open"));
    let store = MemoryCalendar::new();
    let payload =
        CalendarEntry::for_job(&JobRecord::from_post(&p).unwrap(), &settings().entry).unwrap();
    store.seed(payload.clone());
    store.seed(payload);

    let recorder = RecordingObserver::new();
    let engine = Reconciler::new(MemoryFeed::new(BOT, vec![p.clone()]), store, &recorder, settings());

    let outcome = engine.reconcile(&p).await;
    assert!(matches!(
        outcome,
        Outcome::Synced {
            action: SyncAction::Unchanged,
            ..
        }
    ));
    assert_eq!(engine.store().mutations(), 0);
    assert!(recorder.events().contains(&SyncEvent::DuplicateEntries {
        post_id: "p1".to_string(),
        count: 2,
    }));
    assert!(recorder.events().contains(&SyncEvent::Unchanged {
        post_id: "p1".to_string(),
        entry_id: "evt1".to_string(),
    }));
}

#[tokio::test]
async fn test_missing_flair_uses_placeholder() {
    let engine = Reconciler::new(
        MemoryFeed::new(BOT, vec![post("p1", "Heist 2030-05-01 2000 UTC", None)]),
        MemoryCalendar::new(),
        RecordingObserver::new(),
        settings(),
    );
    engine.process_feed().await.unwrap();
    assert_eq!(engine.store().entries()[0].summary, "[JOB FLAIR?] Heist");
}

#[tokio::test]
async fn test_fetch_limit_bounds_the_window() {
    let mut s = settings();
    s.fetch_limit = 1;
    let engine = Reconciler::new(
        MemoryFeed::new(
            BOT,
            vec![
                post("new", HEIST, Some("Job Open")),
                post("old", "Red Hot Cargo 21-08-2031 14:00 UTC", None),
            ],
        ),
        MemoryCalendar::new(),
        RecordingObserver::new(),
        s,
    );
    let report = engine.process_feed().await.unwrap();
    assert_eq!(report.created, 1);
    assert_eq!(engine.store().entries()[0].external_id(), Some("new"));
}

#[tokio::test]
async fn test_feed_failure_aborts_the_pass() {
    let feed = MemoryFeed::new(BOT, vec![post("p1", HEIST, None)]);
    feed.fail_with(Some("503"));
    let engine = Reconciler::new(
        feed,
        MemoryCalendar::new(),
        RecordingObserver::new(),
        settings(),
    );
    assert!(engine.process_feed().await.is_err());
    assert!(engine.run_pass(common::now()).await.is_err());
    assert_eq!(engine.store().mutations(), 0);
}
