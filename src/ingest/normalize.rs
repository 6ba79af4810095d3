// src/ingest/normalize.rs
//! Turns one raw feed record into a [`Candidate`]: text cleanup, timestamp
//! parsing, and the hard rejections (empty title/link, no usable date).

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::OnceCell;
use regex::Regex;
use time::{format_description::well_known::Rfc2822, OffsetDateTime};

use crate::classify::RejectReason;
use crate::config::DigestConfig;
use crate::ingest::types::{Candidate, RawEntry, Track};
use crate::window::kst;

/// Decode HTML entities, strip tags, collapse whitespace, cap length.
/// Deterministic and stable under re-application.
pub fn clean_text(s: &str, max_chars: usize) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
    out = re_tags.replace_all(&out, "").to_string();

    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex"));
    out = re_ws.replace_all(&out, " ").trim().to_string();

    if out.chars().count() > max_chars {
        out = out.chars().take(max_chars).collect();
    }
    out
}

fn parse_date_string(s: &str) -> Option<DateTime<Utc>> {
    // RSS 2.0 prints RFC 2822; try that first. chrono covers the obsolete
    // zone names ("GMT", "UT") the stricter parser refuses.
    if let Ok(dt) = OffsetDateTime::parse(s, &Rfc2822) {
        return DateTime::from_timestamp(dt.unix_timestamp(), 0);
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Bare wall-clock strings carry no offset; assume UTC.
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

fn parse_date_tuple(t: (i32, u32, u32, u32, u32, u32)) -> Option<DateTime<Utc>> {
    let (y, mo, d, h, mi, s) = t;
    Some(
        NaiveDate::from_ymd_opt(y, mo, d)?
            .and_hms_opt(h, mi, s)?
            .and_utc(),
    )
}

/// Timestamp priority: explicit date string, then the pre-parsed tuple.
/// Both are assumed UTC when no offset is present; the result is converted
/// to KST. `None` means the entry has no usable date and must be dropped.
pub fn parse_published_at(entry: &RawEntry) -> Option<DateTime<FixedOffset>> {
    let utc = entry
        .pub_date
        .as_deref()
        .and_then(parse_date_string)
        .or_else(|| entry.published_parsed.and_then(parse_date_tuple))?;
    Some(utc.with_timezone(&kst()))
}

pub fn normalize(
    entry: &RawEntry,
    track: Track,
    keyword: &str,
    cfg: &DigestConfig,
) -> Result<Candidate, RejectReason> {
    let title = clean_text(&entry.title, cfg.limits.title_max_chars);
    if title.is_empty() {
        return Err(RejectReason::EmptyTitle);
    }
    if entry.link.trim().is_empty() {
        return Err(RejectReason::EmptyLink);
    }
    let published_at = parse_published_at(entry).ok_or(RejectReason::NoDate)?;

    let snippet = entry
        .summary
        .as_deref()
        .map(|s| clean_text(s, cfg.limits.snippet_max_chars))
        .unwrap_or_default();

    Ok(Candidate {
        track,
        keyword: keyword.to_string(),
        source_label: entry
            .source_name
            .as_deref()
            .map(|s| clean_text(s, 60))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "뉴스".to_string()),
        title,
        raw_link: Some(entry.link.clone()),
        canonical_link: None,
        published_at,
        snippet,
        score: 0,
    })
}
