// src/resolve.rs
//! Aggregator-link resolution: turn a redirect/search link into the
//! publisher's own URL, or report failure so the caller drops the item.
//!
//! The HTML-scrape fallback depends on page structure that changes without
//! notice, so everything network-shaped hides behind [`UrlFetcher`] and the
//! rest of the pipeline only sees `resolve() -> Option<String>`.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use regex::Regex;
use tracing::debug;
use url::Url;

use crate::classify::Classifier;
use crate::ingest::types::RawEntry;

/// Network boundary for resolution: redirect-chasing without a body read,
/// and a bounded page-prefix fetch for the scrape fallback.
#[async_trait::async_trait]
pub trait UrlFetcher {
    /// Follow redirects and return the final URL. The body is never read.
    async fn final_url(&self, url: &str) -> Result<String>;
    /// Fetch at most `max_bytes` of the response body.
    async fn fetch_prefix(&self, url: &str, max_bytes: usize) -> Result<String>;
}

pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent("Mozilla/5.0 (compatible; GameNewsDigest/0.1)")
            .build()
            .context("building http client")?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl UrlFetcher for ReqwestFetcher {
    async fn final_url(&self, url: &str) -> Result<String> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .context("following redirects")?;
        Ok(resp.url().to_string())
    }

    async fn fetch_prefix(&self, url: &str, max_bytes: usize) -> Result<String> {
        let mut resp = self
            .client
            .get(url)
            .send()
            .await
            .context("fetching page")?
            .error_for_status()
            .context("page fetch non-2xx")?;
        let mut buf: Vec<u8> = Vec::with_capacity(max_bytes.min(64 * 1024));
        while let Some(chunk) = resp.chunk().await.context("reading page body")? {
            buf.extend_from_slice(&chunk);
            if buf.len() >= max_bytes {
                buf.truncate(max_bytes);
                break;
            }
        }
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

fn host_of(link: &str) -> Option<String> {
    Url::parse(link)
        .ok()?
        .host_str()
        .map(str::to_lowercase)
}

fn urls_in(text: &str) -> Vec<String> {
    static RE_URL: OnceCell<Regex> = OnceCell::new();
    let re = RE_URL.get_or_init(|| {
        Regex::new(r#"https?://[A-Za-z0-9.\-]+(?:/[^\s"'<>\\]*)?"#).expect("url regex")
    });
    re.find_iter(text).map(|m| m.as_str().to_string()).collect()
}

pub struct LinkResolver<'f> {
    fetcher: &'f dyn UrlFetcher,
    max_prefix_bytes: usize,
    /// Per-run memo; failed resolutions are cached too.
    cache: HashMap<String, Option<String>>,
}

impl<'f> LinkResolver<'f> {
    pub fn new(fetcher: &'f dyn UrlFetcher, max_prefix_bytes: usize) -> Self {
        Self {
            fetcher,
            max_prefix_bytes,
            cache: HashMap::new(),
        }
    }

    /// Resolve an entry's link to a publisher URL. Strategies run in order and
    /// short-circuit on first success; an aggregator URL is never returned.
    pub async fn resolve(&mut self, entry: &RawEntry, cls: &Classifier) -> Option<String> {
        if let Some(hit) = self.cache.get(&entry.link) {
            return hit.clone();
        }
        let resolved = self.resolve_uncached(entry, cls).await;
        self.cache.insert(entry.link.clone(), resolved.clone());
        resolved
    }

    fn is_publisher_host(&self, host: &str, cls: &Classifier) -> bool {
        cls.site_for_host(host).is_some() && !cls.is_aggregator_host(host)
    }

    async fn resolve_uncached(&self, entry: &RawEntry, cls: &Classifier) -> Option<String> {
        // 1. The feed sometimes links straight to the publisher.
        if let Some(host) = host_of(&entry.link) {
            if self.is_publisher_host(&host, cls) {
                return Some(entry.link.clone());
            }
        }

        // 2. Chase redirects, headers only. Aggregator pages that redirect
        // via scripting land back on their own host and fall through.
        match self.fetcher.final_url(&entry.link).await {
            Ok(final_url) => {
                if let Some(host) = host_of(&final_url) {
                    if self.is_publisher_host(&host, cls) {
                        return Some(final_url);
                    }
                }
            }
            Err(e) => debug!(error = ?e, link = %entry.link, "redirect chase failed"),
        }

        // 3. Entry metadata often embeds the original URL.
        if let Some(found) = self.embedded_url(entry, cls) {
            return Some(found);
        }

        // 4. Last resort: scrape the redirect page for publisher URLs.
        match self
            .fetcher
            .fetch_prefix(&entry.link, self.max_prefix_bytes)
            .await
        {
            Ok(html) => self.extract_from_html(&html, cls),
            Err(e) => {
                debug!(error = ?e, link = %entry.link, "page scrape failed");
                None
            }
        }
    }

    fn embedded_url(&self, entry: &RawEntry, cls: &Classifier) -> Option<String> {
        let mut candidates: Vec<&str> = Vec::new();
        if let Some(src) = entry.source_url.as_deref() {
            candidates.push(src);
        }
        candidates.extend(entry.alternate_links.iter().map(String::as_str));

        let summary_urls = entry.summary.as_deref().map(urls_in).unwrap_or_default();
        candidates.extend(summary_urls.iter().map(String::as_str));

        // `<source url>` usually points at the site root; only URLs with a
        // real path can be the article itself.
        candidates
            .iter()
            .find(|u| {
                host_of(u).is_some_and(|h| self.is_publisher_host(&h, cls))
                    && Url::parse(u).is_ok_and(|p| !p.path().is_empty() && p.path() != "/")
            })
            .map(|u| u.to_string())
    }

    fn extract_from_html(&self, html: &str, cls: &Classifier) -> Option<String> {
        urls_in(html)
            .into_iter()
            .filter(|u| host_of(u).is_some_and(|h| self.is_publisher_host(&h, cls)))
            .filter(|u| cls.is_valid_article_url(u))
            .max_by_key(|u| structural_score(u))
    }
}

/// Structural preference among scraped candidates: article-id-looking query
/// values and deeper paths beat bare section links.
fn structural_score(link: &str) -> i32 {
    let Ok(url) = Url::parse(link) else { return 0 };
    let mut score = 1;
    if url
        .query_pairs()
        .any(|(_, v)| !v.is_empty() && v.chars().all(|c| c.is_ascii_digit()))
    {
        score += 2;
    }
    score += url
        .path_segments()
        .map(|segs| segs.filter(|s| !s.is_empty()).count().min(3) as i32)
        .unwrap_or(0);
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DigestConfig;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted fetcher: a fixed redirect target and a fixed page body,
    /// counting calls so tests can assert memoization and short-circuits.
    struct ScriptedFetcher {
        final_url: Option<String>,
        page: Option<String>,
        calls: AtomicUsize,
    }

    impl ScriptedFetcher {
        fn new(final_url: Option<&str>, page: Option<&str>) -> Self {
            Self {
                final_url: final_url.map(str::to_string),
                page: page.map(str::to_string),
                calls: AtomicUsize::new(0),
            }
        }
        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl UrlFetcher for ScriptedFetcher {
        async fn final_url(&self, _url: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.final_url
                .clone()
                .ok_or_else(|| anyhow::anyhow!("no redirect"))
        }
        async fn fetch_prefix(&self, _url: &str, _max: usize) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.page.clone().ok_or_else(|| anyhow::anyhow!("no page"))
        }
    }

    fn classifier() -> Classifier {
        Classifier::new(&DigestConfig::default_seed())
    }

    fn aggregator_entry() -> RawEntry {
        RawEntry {
            title: "t".into(),
            link: "https://news.google.com/rss/articles/xyz".into(),
            ..RawEntry::default()
        }
    }

    #[tokio::test]
    async fn publisher_links_pass_through_without_network() {
        let fetcher = ScriptedFetcher::new(None, None);
        let mut r = LinkResolver::new(&fetcher, 1024);
        let entry = RawEntry {
            link: "https://www.inven.co.kr/webzine/news/?news=1".into(),
            ..RawEntry::default()
        };
        let out = r.resolve(&entry, &classifier()).await;
        assert_eq!(out.as_deref(), Some("https://www.inven.co.kr/webzine/news/?news=1"));
        assert_eq!(fetcher.call_count(), 0);
    }

    #[tokio::test]
    async fn embedded_links_resolve_without_a_page_fetch() {
        // Redirect lands back on the aggregator (scripted forward); the
        // summary-embedded publisher URL is used instead of scraping.
        let fetcher = ScriptedFetcher::new(Some("https://news.google.com/articles/xyz"), None);
        let mut r = LinkResolver::new(&fetcher, 1024);
        let entry = RawEntry {
            summary: Some(
                "기사 원문: https://www.gamemeca.com/view.php?gid=1829382 에서 확인".into(),
            ),
            ..aggregator_entry()
        };
        let out = r.resolve(&entry, &classifier()).await;
        assert_eq!(
            out.as_deref(),
            Some("https://www.gamemeca.com/view.php?gid=1829382")
        );
        // Only the redirect probe ran; the scrape fallback never fired.
        assert_eq!(fetcher.call_count(), 1);
    }

    #[tokio::test]
    async fn source_root_url_is_not_an_article() {
        let fetcher = ScriptedFetcher::new(None, None);
        let mut r = LinkResolver::new(&fetcher, 1024);
        let entry = RawEntry {
            source_url: Some("https://www.inven.co.kr/".into()),
            ..aggregator_entry()
        };
        // Root-path source URL is skipped; resolution falls through and fails.
        assert_eq!(r.resolve(&entry, &classifier()).await, None);
    }

    #[tokio::test]
    async fn redirect_target_is_accepted_when_it_lands_on_a_publisher() {
        let fetcher =
            ScriptedFetcher::new(Some("https://www.thisisgame.com/webzine/news/nboard/4/?n=212345"), None);
        let mut r = LinkResolver::new(&fetcher, 1024);
        let out = r.resolve(&aggregator_entry(), &classifier()).await;
        assert_eq!(
            out.as_deref(),
            Some("https://www.thisisgame.com/webzine/news/nboard/4/?n=212345")
        );
    }

    #[tokio::test]
    async fn scrape_fallback_prefers_article_shaped_urls() {
        let page = r#"
            <a href="https://www.inven.co.kr/webzine/news/">목록</a>
            <a href="https://www.inven.co.kr/webzine/news/?news=298765">기사</a>
            <a href="https://news.google.com/articles/abc">aggregator</a>
        "#;
        let fetcher = ScriptedFetcher::new(None, Some(page));
        let mut r = LinkResolver::new(&fetcher, 64 * 1024);
        let out = r.resolve(&aggregator_entry(), &classifier()).await;
        assert_eq!(
            out.as_deref(),
            Some("https://www.inven.co.kr/webzine/news/?news=298765")
        );
    }

    #[tokio::test]
    async fn exhausted_resolution_returns_none_never_the_aggregator() {
        let fetcher = ScriptedFetcher::new(Some("https://news.google.com/articles/final"), None);
        let mut r = LinkResolver::new(&fetcher, 1024);
        assert_eq!(r.resolve(&aggregator_entry(), &classifier()).await, None);
    }

    #[tokio::test]
    async fn failures_are_memoized_per_run() {
        let fetcher = ScriptedFetcher::new(None, None);
        let mut r = LinkResolver::new(&fetcher, 1024);
        let entry = aggregator_entry();
        assert_eq!(r.resolve(&entry, &classifier()).await, None);
        let first_round = fetcher.call_count();
        assert_eq!(r.resolve(&entry, &classifier()).await, None);
        assert_eq!(fetcher.call_count(), first_round);
    }
}
