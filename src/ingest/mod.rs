// src/ingest/mod.rs
//! One digest run: query ladder → fetch → normalize → window filter →
//! resolve → classify → (topic gate) → dedup → rank.
//!
//! Per-item failures are counted and skipped; a failed query contributes
//! zero results. Nothing below delivery aborts the batch.

pub mod normalize;
pub mod providers;
pub mod types;

use std::collections::BTreeMap;

use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use rand::Rng;
use tracing::{info, warn};

use crate::classify::{Classifier, RejectReason};
use crate::config::DigestConfig;
use crate::ingest::types::{Candidate, FeedSource, RawEntry, Track};
use crate::query::{strategy_ladder, QueryBuilder};
use crate::rank::{dedup, rank_general, rank_topic};
use crate::resolve::{LinkResolver, UrlFetcher};
use crate::topic::TopicScorer;
use crate::window::ReportingWindow;

/// One-time metrics registration (so series show up if a recorder is installed).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("digest_queries_total", "Search queries issued.");
        describe_counter!("digest_query_errors_total", "Queries that failed outright.");
        describe_counter!("digest_entries_total", "Raw entries seen across all queries.");
        describe_counter!("digest_kept_total", "Candidates accepted into a track.");
        describe_counter!(
            "digest_rejected_total",
            "Candidates rejected, labeled by predicate."
        );
    });
}

/// Per-stage observability for one run.
#[derive(Debug, Default)]
pub struct RunStats {
    pub queries: u64,
    pub query_failures: u64,
    pub entries_seen: u64,
    pub kept: u64,
    pub rejected: BTreeMap<&'static str, u64>,
}

impl RunStats {
    pub fn reject(&mut self, reason: RejectReason) {
        *self.rejected.entry(reason.as_str()).or_insert(0) += 1;
        counter!("digest_rejected_total", "reason" => reason.as_str()).increment(1);
    }

    pub fn rejected_for(&self, reason: RejectReason) -> u64 {
        self.rejected.get(reason.as_str()).copied().unwrap_or(0)
    }
}

/// Final output of the collection pipeline, ready for rendering.
#[derive(Debug)]
pub struct DigestRun {
    pub general: Vec<Candidate>,
    pub topic: Vec<Candidate>,
    pub stats: RunStats,
}

/// Run the whole collection-and-validation pipeline once.
pub async fn run_digest(
    cfg: &DigestConfig,
    window: &ReportingWindow,
    feed: &dyn FeedSource,
    fetcher: &dyn UrlFetcher,
) -> DigestRun {
    ensure_metrics_described();

    let classifier = Classifier::new(cfg);
    let scorer = TopicScorer::new(cfg);
    let mut resolver = LinkResolver::new(fetcher, cfg.limits.fetch_prefix_max_bytes);
    let mut stats = RunStats::default();

    let mut general: Vec<Candidate> = Vec::new();
    let mut topic: Vec<Candidate> = Vec::new();

    for track in [Track::General, Track::Topic] {
        let out = match track {
            Track::General => &mut general,
            Track::Topic => &mut topic,
        };
        collect_track(
            track,
            cfg,
            window,
            feed,
            &classifier,
            &scorer,
            &mut resolver,
            &mut stats,
            out,
        )
        .await;
    }

    counter!("digest_kept_total").increment(stats.kept);
    info!(
        general = general.len(),
        topic = topic.len(),
        queries = stats.queries,
        rejected = ?stats.rejected,
        "collection finished"
    );

    let general = rank_general(dedup(general), cfg.limits.general_cap);
    let topic = rank_topic(dedup(topic), cfg.limits.topic_cap);

    DigestRun {
        general,
        topic,
        stats,
    }
}

#[allow(clippy::too_many_arguments)]
async fn collect_track(
    track: Track,
    cfg: &DigestConfig,
    window: &ReportingWindow,
    feed: &dyn FeedSource,
    classifier: &Classifier,
    scorer: &TopicScorer,
    resolver: &mut LinkResolver<'_>,
    stats: &mut RunStats,
    out: &mut Vec<Candidate>,
) {
    let builder = QueryBuilder::new(cfg);
    let mut accepted = 0usize;

    for (rung, strategy) in strategy_ladder().iter().enumerate() {
        if rung > 0 && accepted >= cfg.limits.min_results {
            break;
        }
        for keyword in strategy.keywords(cfg) {
            if stats.queries > 0 {
                politeness_pause(cfg).await;
            }
            let query = builder.build(keyword, window, track, strategy.restrict_sites);
            stats.queries += 1;
            counter!("digest_queries_total").increment(1);

            let entries = match feed.search(&query).await {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(error = ?e, provider = feed.name(), keyword = %keyword,
                        strategy = strategy.name, "query failed; contributing zero results");
                    stats.query_failures += 1;
                    counter!("digest_query_errors_total").increment(1);
                    continue;
                }
            };

            for raw in &entries {
                stats.entries_seen += 1;
                counter!("digest_entries_total").increment(1);
                if let Some(candidate) = process_entry(
                    raw, track, keyword, cfg, window, classifier, scorer, resolver, stats,
                )
                .await
                {
                    out.push(candidate);
                    accepted += 1;
                    stats.kept += 1;
                }
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn process_entry(
    raw: &RawEntry,
    track: Track,
    keyword: &str,
    cfg: &DigestConfig,
    window: &ReportingWindow,
    classifier: &Classifier,
    scorer: &TopicScorer,
    resolver: &mut LinkResolver<'_>,
    stats: &mut RunStats,
) -> Option<Candidate> {
    let mut candidate = match normalize::normalize(raw, track, keyword, cfg) {
        Ok(c) => c,
        Err(reason) => {
            stats.reject(reason);
            return None;
        }
    };

    if candidate.published_at < window.hard_floor() {
        stats.reject(RejectReason::TooOld);
        return None;
    }
    if !window.contains(candidate.published_at) {
        stats.reject(RejectReason::OutsideWindow);
        return None;
    }
    if let Some(reason) = classifier.non_article_title(&candidate.title) {
        stats.reject(reason);
        return None;
    }

    let Some(canonical) = resolver.resolve(raw, classifier).await else {
        stats.reject(RejectReason::ResolveFailed);
        return None;
    };
    if let Err(reason) = classifier.classify_url(&canonical) {
        stats.reject(reason);
        return None;
    }

    let host = url::Url::parse(&canonical)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))?;
    if !classifier.passes_strict_site_filter(&candidate.title, &candidate.snippet, &host) {
        stats.reject(RejectReason::OffTopicContent);
        return None;
    }

    if track == Track::Topic {
        if !scorer.mentions_entity(&candidate.title, &candidate.snippet) {
            stats.reject(RejectReason::NoEntityMention);
            return None;
        }
        candidate.score = scorer.importance(&candidate.title, &candidate.snippet);
    }

    if let Some(site) = classifier.site_for_host(&host) {
        candidate.source_label = site.label.clone();
    }
    candidate.canonical_link = Some(canonical);
    candidate.raw_link = None;
    Some(candidate)
}

/// Randomized pause between successive outbound queries. A politeness
/// throttle only; max 0 disables it (tests).
async fn politeness_pause(cfg: &DigestConfig) {
    let (min, max) = (cfg.limits.politeness_min_ms, cfg.limits.politeness_max_ms);
    if max == 0 {
        return;
    }
    let ms = if min >= max {
        max
    } else {
        rand::rng().random_range(min..=max)
    };
    tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
}
