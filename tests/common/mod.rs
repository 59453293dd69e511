// Shared fixtures for engine tests.
#![allow(dead_code)]
use chrono::{DateTime, TimeZone, Utc};
use jobcal::engine::EngineSettings;
use jobcal::model::{EntrySettings, SourcePost};
use jobcal::notify::NoticeContext;

pub const BOT: &str = "jobcal-bot";

pub fn settings() -> EngineSettings {
    EngineSettings {
        identity: BOT.to_string(),
        fetch_limit: 20,
        skip_flairs: vec!["META".to_string()],
        sweep_max_results: 50,
        entry: EntrySettings {
            subreddit: "NeonAnarchy".to_string(),
            creator: "calendarbot".to_string(),
            duration: chrono::Duration::hours(3),
        },
        notices: NoticeContext {
            subreddit: "NeonAnarchy".to_string(),
            subreddit_name: "Neon Anarchy".to_string(),
            calendar_public_url: "https://calendar.example/public".to_string(),
            calendar_docs_url: "https://docs.example/bot".to_string(),
            template_post_link: "comments/hjq4ji/example_run/".to_string(),
            contact: "/u/kajh".to_string(),
        },
    }
}

pub fn post(id: &str, title: &str, flair: Option<&str>) -> SourcePost {
    SourcePost {
        id: id.to_string(),
        author: "fredbear".to_string(),
        title: title.to_string(),
        body: String::new(),
        url: format!("https://reddit.com/r/NeonAnarchy/comments/{}/", id),
        permalink: format!("/r/NeonAnarchy/comments/{}/", id),
        flair: flair.map(str::to_string),
    }
}

/// A moment safely before every fixture date.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap()
}
