// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, FixedOffset};

/// Which collection pass produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Track {
    General,
    Topic,
}

/// One raw feed/search-result record, as close to the wire as practical.
/// Field availability varies by feed; the normalizer decides what is usable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEntry {
    pub title: String,
    pub link: String,
    /// Publish date as the feed printed it (RFC 2822 in RSS 2.0).
    pub pub_date: Option<String>,
    /// Pre-parsed (year, month, day, hour, minute, second), assumed UTC.
    pub published_parsed: Option<(i32, u32, u32, u32, u32, u32)>,
    pub summary: Option<String>,
    /// `<source url="...">` attribute, often the publisher's own host.
    pub source_url: Option<String>,
    /// `<source>` element text, the publisher/press name.
    pub source_name: Option<String>,
    /// Alternate/embedded links harvested from entry metadata.
    pub alternate_links: Vec<String>,
}

/// A normalized article candidate, mutated by downstream stages until final.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub track: Track,
    /// Search keyword that surfaced this entry. Provenance, not identity.
    pub keyword: String,
    pub source_label: String,
    pub title: String,
    /// Aggregator/redirect URL as seen in the feed; cleared once resolved.
    pub raw_link: Option<String>,
    /// Resolved publisher URL. Required before the candidate may be emitted.
    pub canonical_link: Option<String>,
    pub published_at: DateTime<FixedOffset>,
    pub snippet: String,
    /// Importance score, topic track only.
    pub score: i32,
}

/// Feed/search client boundary. Implementations must tolerate malformed
/// feeds by returning a partial or empty list, never by panicking.
#[async_trait::async_trait]
pub trait FeedSource {
    async fn search(&self, query: &str) -> Result<Vec<RawEntry>>;
    fn name(&self) -> &'static str;
}
