// File: ./src/bot.rs
//! Wires the real collaborators together and keeps the bot polling.
use crate::client::{GoogleCalendar, HttpClient, RedditFeed};
use crate::config::Config;
use crate::context::AppContext;
use crate::engine::{PassReport, Reconciler, SweepReport};
use crate::observer::LogObserver;
use anyhow::{Context, Result};
use chrono::Utc;
use std::time::Duration;

/// Fallback sleep when the configuration cannot be read at all.
const RETRY_SECS: u64 = 60;

/// Authenticates against both services and runs one reconciliation pass.
pub async fn run_pass(config: &Config) -> Result<(PassReport, SweepReport)> {
    let http = HttpClient::new(&config.reddit.user_agent)?;

    log::info!("Authenticating to Reddit.");
    let feed = RedditFeed::connect(http.clone(), &config.reddit, &config.common.subreddit)
        .await
        .context("unable to authenticate against Reddit")?;

    log::info!("Authenticating to Google.");
    let store = GoogleCalendar::connect(http, &config.google)
        .await
        .context("unable to authenticate against Google")?;

    let engine = Reconciler::new(feed, store, LogObserver, config.engine_settings()?);
    let (report, sweep) = engine.run_pass(Utc::now()).await?;
    log::info!(
        "Pass done: {} created, {} updated, {} unchanged, {} skipped, {} unparsable, {} failed; \
         sweep examined {} and deleted {}",
        report.created,
        report.updated,
        report.unchanged,
        report.skipped,
        report.parse_failed,
        report.store_failed,
        sweep.examined,
        sweep.deleted
    );
    Ok((report, sweep))
}

/// Runs passes until the process is killed.
///
/// Configuration is re-read every cycle so credential or option changes apply
/// without a restart. A failed pass is logged and retried on the next cycle.
pub async fn run_forever(ctx: &dyn AppContext) -> Result<()> {
    loop {
        let interval = match Config::load(ctx) {
            Ok(config) => {
                if let Err(e) = run_pass(&config).await {
                    log::error!("Reconciliation pass failed: {:#}", e);
                }
                config.bot.poll_interval_secs
            }
            Err(e) => {
                log::error!("{:#}", e);
                RETRY_SECS
            }
        };
        log::debug!("Sleeping {}s", interval);
        tokio::time::sleep(Duration::from_secs(interval)).await;
    }
}
