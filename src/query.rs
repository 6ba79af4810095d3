// src/query.rs
//! Search-query composition and the ordered collection-strategy ladder.
//!
//! General track: broad domain-context disjunction ANDed with the keyword and
//! a `site:` restriction. Topic track: entity-name variants replace the
//! context terms and are ANDed with the keyword (precision over recall).

use crate::config::DigestConfig;
use crate::ingest::types::Track;
use crate::window::ReportingWindow;

pub struct QueryBuilder<'a> {
    cfg: &'a DigestConfig,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(cfg: &'a DigestConfig) -> Self {
        Self { cfg }
    }

    pub fn build(
        &self,
        keyword: &str,
        window: &ReportingWindow,
        track: Track,
        restrict_sites: bool,
    ) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(4);

        let lead = match track {
            Track::General => or_group(&self.cfg.keywords.context_terms),
            Track::Topic => or_group_quoted(&self.cfg.entity.variants),
        };
        if let Some(lead) = lead {
            parts.push(lead);
        }

        parts.push(format!("\"{keyword}\""));

        if restrict_sites && !self.cfg.sites.is_empty() {
            let sites: Vec<String> = self
                .cfg
                .sites
                .iter()
                .map(|s| format!("site:{}", s.host))
                .collect();
            parts.push(format!("({})", sites.join(" OR ")));
        }

        parts.push(format!(
            "after:{} before:{}",
            window.start.format("%Y-%m-%d"),
            // `before:` is date-exclusive; push one day past the window end.
            (window.end.date_naive() + chrono::Days::new(1)).format("%Y-%m-%d"),
        ));

        parts.join(" ")
    }
}

fn or_group(terms: &[String]) -> Option<String> {
    (!terms.is_empty()).then(|| format!("({})", terms.join(" OR ")))
}

fn or_group_quoted(terms: &[String]) -> Option<String> {
    (!terms.is_empty()).then(|| {
        let quoted: Vec<String> = terms.iter().map(|t| format!("\"{t}\"")).collect();
        format!("({})", quoted.join(" OR "))
    })
}

/// Which keyword batch a strategy draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordBatch {
    Primary,
    Widened,
}

/// One rung of the fallback ladder. Rungs after the first only run while the
/// accumulated result count stays under the configured threshold.
#[derive(Debug, Clone, Copy)]
pub struct CollectionStrategy {
    pub name: &'static str,
    pub batch: KeywordBatch,
    pub restrict_sites: bool,
}

impl CollectionStrategy {
    pub fn keywords<'c>(&self, cfg: &'c DigestConfig) -> &'c [String] {
        match self.batch {
            KeywordBatch::Primary => &cfg.keywords.primary,
            KeywordBatch::Widened => &cfg.keywords.widened,
        }
    }
}

/// Strict site-restricted pass first; a widened keyword batch when that is
/// thin; site restrictions dropped only as the last resort.
pub fn strategy_ladder() -> Vec<CollectionStrategy> {
    vec![
        CollectionStrategy {
            name: "primary",
            batch: KeywordBatch::Primary,
            restrict_sites: true,
        },
        CollectionStrategy {
            name: "widened-keywords",
            batch: KeywordBatch::Widened,
            restrict_sites: true,
        },
        CollectionStrategy {
            name: "no-site-restriction",
            batch: KeywordBatch::Primary,
            restrict_sites: false,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::{compute_window, kst, WeekendOnly};
    use chrono::TimeZone;

    fn window() -> ReportingWindow {
        let now = kst().with_ymd_and_hms(2026, 8, 4, 8, 30, 0).unwrap();
        compute_window(now, &WeekendOnly)
    }

    #[test]
    fn general_query_shape() {
        let cfg = DigestConfig::default_seed();
        let q = QueryBuilder::new(&cfg).build("투자", &window(), Track::General, true);
        assert!(q.contains("(게임 OR 게임사 OR 게임업계 OR 모바일게임 OR 콘솔 OR PC게임)"));
        assert!(q.contains("\"투자\""));
        assert!(q.contains("site:inven.co.kr OR"));
        assert!(q.contains("after:2026-08-03 before:2026-08-05"));
    }

    #[test]
    fn topic_query_uses_entity_variants_conjoined_with_keyword() {
        let cfg = DigestConfig::default_seed();
        let q = QueryBuilder::new(&cfg).build("투자", &window(), Track::Topic, true);
        assert!(q.starts_with("(\"넥슨\" OR \"넥슨코리아\" OR \"Nexon\") \"투자\""));
        // Entity variants replace, not join, the context vocabulary.
        assert!(!q.contains("게임업계 OR"));
    }

    #[test]
    fn unrestricted_variant_drops_site_operators() {
        let cfg = DigestConfig::default_seed();
        let q = QueryBuilder::new(&cfg).build("투자", &window(), Track::General, false);
        assert!(!q.contains("site:"));
    }

    #[test]
    fn ladder_ordering_and_batches() {
        let ladder = strategy_ladder();
        assert_eq!(ladder.len(), 3);
        assert!(ladder[0].restrict_sites);
        assert_eq!(ladder[1].batch, KeywordBatch::Widened);
        assert!(!ladder[2].restrict_sites);

        let cfg = DigestConfig::default_seed();
        assert_eq!(ladder[0].keywords(&cfg), cfg.keywords.primary.as_slice());
        assert_eq!(ladder[1].keywords(&cfg), cfg.keywords.widened.as_slice());
    }
}
