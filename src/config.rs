// File: ./src/config.rs
// Handles configuration loading and defaults.
use crate::context::AppContext;
use crate::engine::EngineSettings;
use crate::model::EntrySettings;
use crate::notify::NoticeContext;
use anyhow::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;

fn default_user_agent() -> String {
    format!("jobcal/{} (calendar bot)", env!("CARGO_PKG_VERSION"))
}
fn default_fetch_limit() -> usize {
    20
}
fn default_reddit_auth_url() -> String {
    "https://www.reddit.com/api/v1/access_token".to_string()
}
fn default_reddit_api_base() -> String {
    "https://oauth.reddit.com".to_string()
}

fn default_google_token_url() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}
fn default_google_api_base() -> String {
    "https://www.googleapis.com/calendar/v3".to_string()
}

fn default_poll_interval() -> u64 {
    300
}
fn default_skip_flairs() -> Vec<String> {
    vec!["META".to_string()]
}
fn default_event_duration() -> i64 {
    3
}
/// Longest accepted event, one leap year.
pub const MAX_EVENT_DURATION_HOURS: i64 = 24 * 366;

fn default_sweep_max_results() -> usize {
    50
}
fn default_contact() -> String {
    "the moderators".to_string()
}

#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct CommonConfig {
    pub subreddit: String,
    /// Human-readable community name used in notices.
    #[serde(default)]
    pub subreddit_name: String,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct RedditConfig {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Path of the sticky example post, relative to the subreddit.
    #[serde(default)]
    pub template_post_link: String,
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: usize,
    #[serde(default = "default_reddit_auth_url")]
    pub auth_url: String,
    #[serde(default = "default_reddit_api_base")]
    pub api_base: String,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            username: String::new(),
            password: String::new(),
            user_agent: default_user_agent(),
            template_post_link: String::new(),
            fetch_limit: default_fetch_limit(),
            auth_url: default_reddit_auth_url(),
            api_base: default_reddit_api_base(),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct GoogleConfig {
    pub calendar_id: String,
    #[serde(default)]
    pub calendar_public_url: String,
    #[serde(default)]
    pub calendar_docs_url: String,
    /// Stored on every event as the `createdBy` shared property.
    #[serde(default)]
    pub creator: String,
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    #[serde(default = "default_google_token_url")]
    pub token_url: String,
    #[serde(default = "default_google_api_base")]
    pub api_base: String,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            calendar_id: String::new(),
            calendar_public_url: String::new(),
            calendar_docs_url: String::new(),
            creator: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            refresh_token: String::new(),
            token_url: default_google_token_url(),
            api_base: default_google_api_base(),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct BotConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Flair markers (case-insensitive substrings) that exclude a post.
    #[serde(default = "default_skip_flairs")]
    pub skip_flairs: Vec<String>,
    #[serde(default = "default_event_duration")]
    pub event_duration_hours: i64,
    #[serde(default = "default_sweep_max_results")]
    pub sweep_max_results: usize,
    #[serde(default = "default_contact")]
    pub contact: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            skip_flairs: default_skip_flairs(),
            event_duration_hours: default_event_duration(),
            sweep_max_results: default_sweep_max_results(),
            contact: default_contact(),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct Config {
    pub common: CommonConfig,
    pub reddit: RedditConfig,
    pub google: GoogleConfig,
    #[serde(default)]
    pub bot: BotConfig,
}

impl Config {
    /// Load the configuration from disk using an explicit context.
    pub fn load(ctx: &dyn AppContext) -> Result<Self> {
        let path = ctx.get_config_file_path()?;

        if !path.exists() {
            return Err(anyhow::anyhow!(
                "Config file not found: {}",
                path.display()
            ));
        }

        let contents = fs::read_to_string(&path).map_err(|e| {
            anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e)
        })?;

        Self::parse(&contents).map_err(|e| {
            anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e)
        })
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        if config.common.subreddit.trim().is_empty() {
            return Err(anyhow::anyhow!("[common] subreddit must not be empty"));
        }
        let hours = config.bot.event_duration_hours;
        if !(1..=MAX_EVENT_DURATION_HOURS).contains(&hours) {
            return Err(anyhow::anyhow!(
                "[bot] event_duration_hours must be between 1 and {}, got {}",
                MAX_EVENT_DURATION_HOURS,
                hours
            ));
        }
        Ok(config)
    }

    /// Helper to detect whether an anyhow::Error indicates that the config file was missing.
    pub fn is_missing_config_error(err: &Error) -> bool {
        if err.to_string().contains("Config file not found") {
            return true;
        }
        err.chain().any(|cause| {
            cause
                .downcast_ref::<std::io::Error>()
                .is_some_and(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
        })
    }

    pub fn get_path_string(ctx: &dyn AppContext) -> Result<String> {
        let path = ctx.get_config_file_path()?;
        Ok(path.to_string_lossy().to_string())
    }

    /// Display name for notices, falling back to the subreddit.
    pub fn subreddit_name(&self) -> &str {
        if self.common.subreddit_name.is_empty() {
            &self.common.subreddit
        } else {
            &self.common.subreddit_name
        }
    }

    pub fn entry_settings(&self) -> Result<EntrySettings> {
        let hours = self.bot.event_duration_hours;
        let duration = chrono::Duration::try_hours(hours)
            .ok_or_else(|| anyhow::anyhow!("event duration of {} hours is out of range", hours))?;
        Ok(EntrySettings {
            subreddit: self.common.subreddit.clone(),
            creator: self.google.creator.clone(),
            duration,
        })
    }

    pub fn notice_context(&self) -> NoticeContext {
        NoticeContext {
            subreddit: self.common.subreddit.clone(),
            subreddit_name: self.subreddit_name().to_string(),
            calendar_public_url: self.google.calendar_public_url.clone(),
            calendar_docs_url: self.google.calendar_docs_url.clone(),
            template_post_link: self.reddit.template_post_link.clone(),
            contact: self.bot.contact.clone(),
        }
    }

    pub fn engine_settings(&self) -> Result<EngineSettings> {
        Ok(EngineSettings {
            identity: self.reddit.username.clone(),
            fetch_limit: self.reddit.fetch_limit,
            skip_flairs: self.bot.skip_flairs.clone(),
            sweep_max_results: self.bot.sweep_max_results,
            entry: self.entry_settings()?,
            notices: self.notice_context(),
        })
    }
}
