//! Game-Industry News Digest — Batch Entrypoint
//!
//! One stateless run: compute the reporting window, collect and validate
//! candidate articles, and deliver the formatted digest to Slack. Exits
//! non-zero when delivery is impossible; an empty digest is not an error.

use std::time::Duration;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use game_news_digest::config::DigestConfig;
use game_news_digest::ingest::providers::google_news::GoogleNewsClient;
use game_news_digest::notify::{deliver_chunks, SlackNotifier};
use game_news_digest::resolve::ReqwestFetcher;
use game_news_digest::window::{compute_window, kst, load_holiday_calendar};
use game_news_digest::{digest, ingest};

/// Pause between successive webhook sends when the digest spans chunks.
const CHUNK_SEND_PAUSE: Duration = Duration::from_millis(700);

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("game_news_digest=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op in scheduled environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = DigestConfig::load();

    // Fail fast: a run that cannot deliver has no value in proceeding.
    let notifier = SlackNotifier::from_env()?;

    let holidays = load_holiday_calendar();
    let now = chrono::Utc::now().with_timezone(&kst());
    let window = compute_window(now, holidays.as_ref());
    info!(start = %window.start, end = %window.end, label = %window.label, "reporting window");

    let timeout = Duration::from_secs(cfg.limits.request_timeout_secs);
    let feed = GoogleNewsClient::new(timeout);
    let fetcher = ReqwestFetcher::new(timeout)?;

    let run = ingest::run_digest(&cfg, &window, &feed, &fetcher).await;

    let body = digest::render(&window, &run.general, &run.topic);
    let chunks = digest::chunk_message(&body, cfg.limits.chunk_limit);
    info!(chunks = chunks.len(), chars = body.chars().count(), "delivering digest");

    deliver_chunks(&notifier, &chunks, CHUNK_SEND_PAUSE).await?;

    info!("digest delivered");
    Ok(())
}
