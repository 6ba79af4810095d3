// src/rank.rs
//! Deduplication and final ordering.
//!
//! Identity is a digest of (title, canonical link); keyword provenance does
//! not participate, so the same article surfaced by two queries collapses to
//! one emitted item. Last write wins — duplicate identity implies field
//! equality after resolution.

use std::collections::HashMap;

use sha2::{Digest, Sha256};

use crate::ingest::types::Candidate;

/// Short stable identity for (title, canonical link).
pub fn identity_hash(title: &str, canonical_link: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(b"\n");
    hasher.update(canonical_link.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(16);
    for b in digest.iter().take(8) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Collapse to one candidate per identity, preserving first-seen position.
pub fn dedup(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut index: HashMap<String, usize> = HashMap::with_capacity(candidates.len());
    let mut out: Vec<Candidate> = Vec::with_capacity(candidates.len());
    for cand in candidates {
        let key = identity_hash(
            &cand.title,
            cand.canonical_link.as_deref().unwrap_or_default(),
        );
        match index.get(&key) {
            Some(&at) => out[at] = cand,
            None => {
                index.insert(key, out.len());
                out.push(cand);
            }
        }
    }
    out
}

/// General track: newest first, capped.
pub fn rank_general(mut candidates: Vec<Candidate>, cap: usize) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    candidates.truncate(cap);
    candidates
}

/// Topic track: importance first, recency as tiebreak, capped.
pub fn rank_topic(mut candidates: Vec<Candidate>, cap: usize) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| b.published_at.cmp(&a.published_at))
    });
    candidates.truncate(cap);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::Track;
    use crate::window::kst;
    use chrono::TimeZone;

    fn cand(title: &str, link: &str, keyword: &str, hour: u32, score: i32) -> Candidate {
        Candidate {
            track: Track::General,
            keyword: keyword.into(),
            source_label: "인벤".into(),
            title: title.into(),
            raw_link: None,
            canonical_link: Some(link.into()),
            published_at: kst().with_ymd_and_hms(2026, 8, 3, hour, 0, 0).unwrap(),
            snippet: String::new(),
            score,
        }
    }

    #[test]
    fn identical_identity_collapses_across_keyword_provenance() {
        let a = cand("넥슨 신작 발표", "https://a.kr/news?news=1", "신작", 11, 0);
        let b = cand("넥슨 신작 발표", "https://a.kr/news?news=1", "투자", 12, 0);
        let out = dedup(vec![a, b]);
        assert_eq!(out.len(), 1);
        // Last write wins.
        assert_eq!(out[0].keyword, "투자");
    }

    #[test]
    fn distinct_links_survive_dedup() {
        let a = cand("같은 제목", "https://a.kr/news?news=1", "신작", 11, 0);
        let b = cand("같은 제목", "https://a.kr/news?news=2", "신작", 12, 0);
        assert_eq!(dedup(vec![a, b]).len(), 2);
    }

    #[test]
    fn general_ranking_is_recency_only() {
        let out = rank_general(
            vec![
                cand("old", "https://a.kr/1", "k", 10, 0),
                cand("new", "https://a.kr/2", "k", 15, 0),
                cand("mid", "https://a.kr/3", "k", 12, 0),
            ],
            2,
        );
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].title, "new");
        assert_eq!(out[1].title, "mid");
    }

    #[test]
    fn topic_ranking_prefers_score_then_recency() {
        let out = rank_topic(
            vec![
                cand("low-new", "https://a.kr/1", "k", 15, 2),
                cand("high-old", "https://a.kr/2", "k", 10, 9),
                cand("high-new", "https://a.kr/3", "k", 14, 9),
            ],
            5,
        );
        assert_eq!(out[0].title, "high-new");
        assert_eq!(out[1].title, "high-old");
        assert_eq!(out[2].title, "low-new");
    }

    #[test]
    fn identity_hash_is_stable_and_link_sensitive() {
        let h1 = identity_hash("t", "https://a.kr/1");
        assert_eq!(h1, identity_hash("t", "https://a.kr/1"));
        assert_ne!(h1, identity_hash("t", "https://a.kr/2"));
        assert_eq!(h1.len(), 16);
    }
}
