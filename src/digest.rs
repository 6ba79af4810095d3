// src/digest.rs
//! Digest rendering and size-bounded chunking for webhook delivery.

use crate::ingest::types::Candidate;
use crate::window::ReportingWindow;

/// Render the full digest body in Slack markdown. Empty sections state so
/// explicitly: a run with zero qualifying articles is still a valid digest.
pub fn render(window: &ReportingWindow, general: &[Candidate], topic: &[Candidate]) -> String {
    let mut out = String::new();
    out.push_str(&format!("## 📰 {} 게임업계 뉴스 브리핑\n\n", window.label));

    out.push_str("### 🌐 주요 게임업계 뉴스\n");
    if general.is_empty() {
        out.push_str("- 이번 집계 구간에 지정된 키워드를 포함한 주요 뉴스가 없습니다.\n\n");
    } else {
        for article in general {
            push_article(&mut out, article);
        }
        out.push('\n');
    }

    out.push_str("---\n### 🏢 넥슨 관련 주요 뉴스\n");
    if topic.is_empty() {
        out.push_str("- 위 기사들 중, '넥슨' 관련 뉴스는 없습니다.\n");
    } else {
        for article in topic {
            push_article(&mut out, article);
        }
    }

    out
}

fn push_article(out: &mut String, article: &Candidate) {
    out.push_str(&format!(
        "▶ *[{}] {}*\n",
        article.source_label, article.title
    ));
    if let Some(link) = article.canonical_link.as_deref() {
        out.push_str(&format!("   - 링크: <{link}>\n"));
    }
}

/// Split `body` into chunks of at most `limit` characters, breaking only at
/// line boundaries; a single line over the limit is hard-split as a last
/// resort. Concatenating the chunks in order reproduces `body` exactly.
pub fn chunk_message(body: &str, limit: usize) -> Vec<String> {
    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;

    for line in body.split_inclusive('\n') {
        let line_chars = line.chars().count();

        if line_chars > limit {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_chars = 0;
            }
            let mut piece = String::new();
            let mut piece_chars = 0usize;
            for ch in line.chars() {
                piece.push(ch);
                piece_chars += 1;
                if piece_chars == limit {
                    chunks.push(std::mem::take(&mut piece));
                    piece_chars = 0;
                }
            }
            if !piece.is_empty() {
                current = piece;
                current_chars = piece_chars;
            }
            continue;
        }

        if current_chars + line_chars > limit {
            chunks.push(std::mem::take(&mut current));
            current_chars = 0;
        }
        current.push_str(line);
        current_chars += line_chars;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::Track;
    use crate::window::{compute_window, kst, WeekendOnly};
    use chrono::TimeZone;

    fn window() -> ReportingWindow {
        compute_window(kst().with_ymd_and_hms(2026, 8, 4, 8, 30, 0).unwrap(), &WeekendOnly)
    }

    fn article(title: &str, link: &str) -> Candidate {
        Candidate {
            track: Track::General,
            keyword: "신작".into(),
            source_label: "인벤".into(),
            title: title.into(),
            raw_link: None,
            canonical_link: Some(link.into()),
            published_at: kst().with_ymd_and_hms(2026, 8, 3, 18, 0, 0).unwrap(),
            snippet: String::new(),
            score: 0,
        }
    }

    #[test]
    fn renders_sections_with_articles() {
        let body = render(
            &window(),
            &[article("넥슨 신작 발표", "https://a.kr/news?news=1")],
            &[],
        );
        assert!(body.contains("2026-08-04 게임업계 뉴스 브리핑"));
        assert!(body.contains("▶ *[인벤] 넥슨 신작 발표*"));
        assert!(body.contains("<https://a.kr/news?news=1>"));
        assert!(body.contains("'넥슨' 관련 뉴스는 없습니다"));
    }

    #[test]
    fn empty_run_is_a_valid_digest() {
        let body = render(&window(), &[], &[]);
        assert!(body.contains("주요 뉴스가 없습니다"));
        assert!(body.contains("'넥슨' 관련 뉴스는 없습니다"));
    }

    #[test]
    fn chunking_splits_at_line_boundaries_and_reassembles_exactly() {
        // ~9000 chars of lines well under 200 chars each.
        let line = "▶ *[인벤] 넥슨이 새로운 MMORPG 프로젝트를 공개했습니다*\n";
        let body: String = std::iter::repeat(line).take(300).collect();
        assert!(body.chars().count() > 9000);

        let chunks = chunk_message(&body, 3500);
        assert!(chunks.len() >= 3, "expected ≥3 chunks, got {}", chunks.len());
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 3500);
            // Whole-line splits only: every chunk ends on a newline here.
            assert!(chunk.ends_with('\n'));
        }
        assert_eq!(chunks.concat(), body);
    }

    #[test]
    fn oversized_single_line_is_hard_split() {
        let body = "a".repeat(8000);
        let chunks = chunk_message(&body, 3500);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks.concat(), body);
        assert!(chunks.iter().all(|c| c.chars().count() <= 3500));
    }

    #[test]
    fn small_bodies_stay_whole() {
        let chunks = chunk_message("short\nbody\n", 3500);
        assert_eq!(chunks, vec!["short\nbody\n".to_string()]);
    }
}
