// src/classify.rs
//! Article-vs-noise classification: per-site URL conventions, title blockers,
//! and the strict content filter for general-interest sites.
//!
//! Every check is a named predicate yielding a [`RejectReason`], so rejection
//! statistics and tests can target a specific rule instead of an opaque bool.
//! Classification is monotonic: any single rejection is final.

use url::Url;

use crate::config::{DigestConfig, SiteConfig, SiteRule};

/// Why a candidate was dropped. One label per pipeline predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    EmptyTitle,
    EmptyLink,
    NoDate,
    TooOld,
    OutsideWindow,
    MalformedUrl,
    AggregatorHost,
    UnknownHost,
    BoardPath,
    MissingArticleParam,
    BadPathToken,
    EmptyPath,
    NonArticleTitle,
    OffTopicContent,
    NoEntityMention,
    ResolveFailed,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmptyTitle => "empty_title",
            Self::EmptyLink => "empty_link",
            Self::NoDate => "no_date",
            Self::TooOld => "too_old",
            Self::OutsideWindow => "outside_window",
            Self::MalformedUrl => "malformed_url",
            Self::AggregatorHost => "aggregator_host",
            Self::UnknownHost => "unknown_host",
            Self::BoardPath => "board_path",
            Self::MissingArticleParam => "missing_article_param",
            Self::BadPathToken => "bad_path_token",
            Self::EmptyPath => "empty_path",
            Self::NonArticleTitle => "non_article_title",
            Self::OffTopicContent => "off_topic_content",
            Self::NoEntityMention => "no_entity_mention",
            Self::ResolveFailed => "resolve_failed",
        }
    }
}

/// Path segments that mark list/search/community pages on any host.
const BAD_PATH_SEGMENTS: &[&str] = &[
    "search", "tag", "ranking", "gallery", "forum", "community", "login", "member",
];

pub struct Classifier {
    sites: Vec<SiteConfig>,
    aggregator_hosts: Vec<String>,
    title_blockers: Vec<String>,
    relevance_terms: Vec<String>,
}

fn host_matches(host: &str, site_host: &str) -> bool {
    host == site_host || host.ends_with(&format!(".{site_host}"))
}

impl Classifier {
    pub fn new(cfg: &DigestConfig) -> Self {
        Self {
            sites: cfg.sites.clone(),
            aggregator_hosts: cfg.aggregator_hosts.clone(),
            title_blockers: cfg.title_blockers.clone(),
            relevance_terms: cfg
                .keywords
                .relevance_terms
                .iter()
                .map(|t| t.to_lowercase())
                .collect(),
        }
    }

    pub fn site_for_host(&self, host: &str) -> Option<&SiteConfig> {
        self.sites.iter().find(|s| host_matches(host, &s.host))
    }

    pub fn is_aggregator_host(&self, host: &str) -> bool {
        self.aggregator_hosts.iter().any(|a| host_matches(host, a))
    }

    /// Run the ordered URL predicate chain. `Ok(())` means the URL follows a
    /// target site's real-article convention.
    pub fn classify_url(&self, link: &str) -> Result<(), RejectReason> {
        let url = Url::parse(link).map_err(|_| RejectReason::MalformedUrl)?;
        let host = url
            .host_str()
            .map(str::to_lowercase)
            .ok_or(RejectReason::MalformedUrl)?;

        if self.is_aggregator_host(&host) {
            return Err(RejectReason::AggregatorHost);
        }
        let site = self
            .site_for_host(&host)
            .ok_or(RejectReason::UnknownHost)?;

        let path = url.path();
        if path.is_empty() || path == "/" {
            return Err(RejectReason::EmptyPath);
        }
        if url
            .path_segments()
            .into_iter()
            .flatten()
            .any(|seg| BAD_PATH_SEGMENTS.contains(&seg))
        {
            return Err(RejectReason::BadPathToken);
        }

        for rule in &site.rules {
            match rule {
                SiteRule::DenyPath { prefix } => {
                    if path.starts_with(prefix.as_str()) {
                        return Err(RejectReason::BoardPath);
                    }
                }
                SiteRule::RequireParam {
                    prefix,
                    param,
                    numeric,
                } => {
                    if !path.starts_with(prefix.as_str()) {
                        continue;
                    }
                    let value = url
                        .query_pairs()
                        .find(|(k, _)| k.as_ref() == param.as_str())
                        .map(|(_, v)| v.into_owned());
                    match value {
                        Some(v)
                            if !v.is_empty()
                                && (!numeric || v.chars().all(|c| c.is_ascii_digit())) => {}
                        _ => return Err(RejectReason::MissingArticleParam),
                    }
                }
            }
        }

        Ok(())
    }

    pub fn is_valid_article_url(&self, link: &str) -> bool {
        self.classify_url(link).is_ok()
    }

    /// Title-pattern rejection: recruitment, spoiler, guide, match-result,
    /// and placeholder titles are never articles.
    pub fn non_article_title(&self, title: &str) -> Option<RejectReason> {
        self.title_blockers
            .iter()
            .any(|p| title.contains(p.as_str()))
            .then_some(RejectReason::NonArticleTitle)
    }

    /// General-interest sites mix in coverage far outside the games beat;
    /// require one domain-relevance hit in title+snippet. Domain-exclusive
    /// sites pass unconditionally.
    pub fn passes_strict_site_filter(&self, title: &str, snippet: &str, host: &str) -> bool {
        let strict = self
            .site_for_host(host)
            .map(|s| s.general_interest)
            .unwrap_or(false);
        if !strict {
            return true;
        }
        let haystack = format!("{title} {snippet}").to_lowercase();
        self.relevance_terms.iter().any(|t| haystack.contains(t.as_str()))
    }
}
