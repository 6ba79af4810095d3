// src/ingest/providers/google_news.rs
//! Google News RSS search client. One query string in, raw entries out;
//! HTTP or parse failure means zero results for that query, never a dead run.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use once_cell::sync::OnceCell;
use quick_xml::de::from_str;
use regex::Regex;
use serde::Deserialize;
use url::Url;

use crate::ingest::types::{FeedSource, RawEntry};

const SEARCH_ENDPOINT: &str = "https://news.google.com/rss/search";

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    source: Option<Source>,
}

#[derive(Debug, Deserialize)]
struct Source {
    #[serde(rename = "@url")]
    url: Option<String>,
    #[serde(rename = "$text")]
    name: Option<String>,
}

/// Hrefs embedded in the description HTML; Google News wraps the original
/// article link in there.
fn embedded_hrefs(description: &str) -> Vec<String> {
    static RE_HREF: OnceCell<Regex> = OnceCell::new();
    let re = RE_HREF.get_or_init(|| Regex::new(r#"href="([^"]+)""#).expect("href regex"));
    re.captures_iter(description)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

pub struct GoogleNewsClient {
    client: reqwest::Client,
    endpoint: String,
}

impl GoogleNewsClient {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (compatible; GameNewsDigest/0.1)")
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            endpoint: SEARCH_ENDPOINT.to_string(),
        }
    }

    #[cfg(test)]
    fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    fn search_url(&self, query: &str) -> Result<Url> {
        Url::parse_with_params(
            &self.endpoint,
            &[("q", query), ("hl", "ko"), ("gl", "KR"), ("ceid", "KR:ko")],
        )
        .context("building search url")
    }

    /// Parse an RSS 2.0 payload into raw entries. Field-level problems stay
    /// item-local; the normalizer decides what is usable.
    pub fn parse_feed(xml: &str) -> Result<Vec<RawEntry>> {
        let rss: Rss = from_str(xml).context("parsing news rss xml")?;
        let mut out = Vec::with_capacity(rss.channel.item.len());
        for item in rss.channel.item {
            let alternate_links = item
                .description
                .as_deref()
                .map(embedded_hrefs)
                .unwrap_or_default();
            out.push(RawEntry {
                title: item.title.unwrap_or_default(),
                link: item.link.unwrap_or_default(),
                pub_date: item.pub_date,
                published_parsed: None,
                summary: item.description,
                source_url: item.source.as_ref().and_then(|s| s.url.clone()),
                source_name: item.source.and_then(|s| s.name),
                alternate_links,
            });
        }
        Ok(out)
    }
}

#[async_trait]
impl FeedSource for GoogleNewsClient {
    async fn search(&self, query: &str) -> Result<Vec<RawEntry>> {
        let url = self.search_url(query)?;
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .context("fetching news feed")?;
        if !resp.status().is_success() {
            bail!("news feed returned status {}", resp.status());
        }
        let body = resp.text().await.context("reading news feed body")?;
        Self::parse_feed(&body)
    }

    fn name(&self) -> &'static str {
        "GoogleNews"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>"신작" - Google 뉴스</title>
    <item>
      <title>넥슨, 신작 MMORPG 공개</title>
      <link>https://news.google.com/rss/articles/CBMiabc?oc=5</link>
      <pubDate>Mon, 03 Aug 2026 02:10:00 GMT</pubDate>
      <description>&lt;a href="https://www.inven.co.kr/webzine/news/?news=298765"&gt;넥슨, 신작 MMORPG 공개&lt;/a&gt;</description>
      <source url="https://www.inven.co.kr">인벤</source>
    </item>
    <item>
      <title></title>
      <link>https://news.google.com/rss/articles/CBMidef?oc=5</link>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn parses_items_with_source_metadata() {
        let entries = GoogleNewsClient::parse_feed(FIXTURE).unwrap();
        assert_eq!(entries.len(), 2);

        let first = &entries[0];
        assert_eq!(first.title, "넥슨, 신작 MMORPG 공개");
        assert_eq!(first.source_name.as_deref(), Some("인벤"));
        assert_eq!(first.source_url.as_deref(), Some("https://www.inven.co.kr"));
        assert_eq!(
            first.alternate_links,
            vec!["https://www.inven.co.kr/webzine/news/?news=298765".to_string()]
        );
        assert!(first.pub_date.as_deref().unwrap().contains("2026"));

        // Malformed items come through raw; rejection is the normalizer's job.
        assert!(entries[1].title.is_empty());
    }

    #[test]
    fn empty_channels_yield_empty_lists() {
        let xml = r#"<rss version="2.0"><channel><title>empty</title></channel></rss>"#;
        assert!(GoogleNewsClient::parse_feed(xml).unwrap().is_empty());
    }

    #[test]
    fn search_url_carries_locale_params() {
        let client = GoogleNewsClient::new(Duration::from_secs(5))
            .with_endpoint("https://news.google.com/rss/search");
        let url = client.search_url("\"신작\" site:inven.co.kr").unwrap();
        let query = url.query().unwrap();
        assert!(query.contains("hl=ko"));
        assert!(query.contains("gl=KR"));
        assert!(query.contains("ceid=KR%3Ako"));
    }
}
