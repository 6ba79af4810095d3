// src/config.rs
//! Run configuration: target sites, keyword lists, entity variants, scoring
//! weights, and output limits.
//!
//! Loaded from TOML (`config/digest.toml` or `$DIGEST_CONFIG_PATH`) with a
//! compiled-in seed as fallback, so every component can also be driven by a
//! synthetic config in tests.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

pub const ENV_CONFIG_PATH: &str = "DIGEST_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/digest.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct DigestConfig {
    #[serde(default)]
    pub sites: Vec<SiteConfig>,
    #[serde(default)]
    pub keywords: KeywordConfig,
    #[serde(default)]
    pub entity: EntityConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub limits: LimitConfig,
    /// Hosts of search/aggregation services whose links must never be emitted.
    #[serde(default = "default_aggregator_hosts")]
    pub aggregator_hosts: Vec<String>,
    /// Title substrings marking board/recruitment/guide posts as non-articles.
    #[serde(default = "default_title_blockers")]
    pub title_blockers: Vec<String>,
}

/// One target press site: host, human-readable label, and the URL conventions
/// that distinguish its real articles from list/board pages.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    pub host: String,
    pub label: String,
    /// Sites whose coverage extends beyond games need a content-relevance
    /// check on top of the URL rules.
    #[serde(default)]
    pub general_interest: bool,
    #[serde(default)]
    pub rules: Vec<SiteRule>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SiteRule {
    /// Everything under this path prefix is forum/board content.
    DenyPath { prefix: String },
    /// Article pages under `prefix` require this query parameter; list and
    /// search pages share the prefix but lack it.
    RequireParam {
        prefix: String,
        param: String,
        #[serde(default)]
        numeric: bool,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeywordConfig {
    /// Primary search keywords, one query per keyword.
    pub primary: Vec<String>,
    /// Secondary batch used when the primary pass yields too few results.
    #[serde(default)]
    pub widened: Vec<String>,
    /// Broad domain vocabulary ORed into general-track queries to
    /// disambiguate keywords shared with other industries.
    #[serde(default)]
    pub context_terms: Vec<String>,
    /// Relevance vocabulary for the strict filter on general-interest sites.
    #[serde(default)]
    pub relevance_terms: Vec<String>,
}

impl Default for KeywordConfig {
    fn default() -> Self {
        DigestConfig::default_seed().keywords
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntityConfig {
    /// Name variants of the entity of interest, matched case-insensitively.
    pub variants: Vec<String>,
}

impl Default for EntityConfig {
    fn default() -> Self {
        DigestConfig::default_seed().entity
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    /// Importance weight per keyword. The ordering encodes business
    /// materiality: M&A and litigation terms outrank routine release terms.
    pub weights: BTreeMap<String, i32>,
    #[serde(default = "default_entity_bonus")]
    pub entity_bonus: i32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        DigestConfig::default_seed().scoring
    }
}

fn default_entity_bonus() -> i32 {
    3
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitConfig {
    pub general_cap: usize,
    pub topic_cap: usize,
    /// Fewer accepted articles than this triggers the next collection strategy.
    pub min_results: usize,
    /// Per-chunk character budget for webhook delivery.
    pub chunk_limit: usize,
    pub title_max_chars: usize,
    pub snippet_max_chars: usize,
    /// Bounded read for the HTML-scrape resolution fallback.
    pub fetch_prefix_max_bytes: usize,
    pub request_timeout_secs: u64,
    /// Politeness jitter between successive queries; max 0 disables the pause.
    pub politeness_min_ms: u64,
    pub politeness_max_ms: u64,
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            general_cap: 20,
            topic_cap: 5,
            min_results: 10,
            chunk_limit: 3500,
            title_max_chars: 200,
            snippet_max_chars: 300,
            fetch_prefix_max_bytes: 512 * 1024,
            request_timeout_secs: 12,
            politeness_min_ms: 400,
            politeness_max_ms: 900,
        }
    }
}

fn default_aggregator_hosts() -> Vec<String> {
    ["news.google.com", "google.com", "google.co.kr"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn default_title_blockers() -> Vec<String> {
    [
        "채용", "모집", "공략", "꿀팁", "스포일러", "[스포", "경기 결과", "매치 결과", "웹진",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

impl DigestConfig {
    /// Load from `$DIGEST_CONFIG_PATH`, then `config/digest.toml`, then the
    /// compiled-in seed.
    pub fn load() -> Self {
        let path = std::env::var(ENV_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::load_from_file(&path)
    }

    pub fn load_from_file(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(s) => match toml::from_str(&s) {
                Ok(cfg) => cfg,
                Err(e) => {
                    warn!(error = %e, path = %path.display(), "config unreadable; using built-in seed");
                    Self::default_seed()
                }
            },
            Err(_) => Self::default_seed(),
        }
    }

    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Built-in seed mirroring `config/digest.toml`. Used as fallback and as
    /// the baseline for unit tests.
    pub fn default_seed() -> Self {
        let sites = vec![
            SiteConfig {
                host: "inven.co.kr".into(),
                label: "인벤".into(),
                general_interest: false,
                rules: vec![
                    SiteRule::DenyPath {
                        prefix: "/board/".into(),
                    },
                    SiteRule::RequireParam {
                        prefix: "/webzine/news".into(),
                        param: "news".into(),
                        numeric: false,
                    },
                ],
            },
            SiteConfig {
                host: "gamemeca.com".into(),
                label: "게임메카".into(),
                general_interest: false,
                rules: vec![SiteRule::RequireParam {
                    prefix: "/view.php".into(),
                    param: "gid".into(),
                    numeric: true,
                }],
            },
            SiteConfig {
                host: "thisisgame.com".into(),
                label: "디스이즈게임".into(),
                general_interest: false,
                rules: vec![SiteRule::RequireParam {
                    prefix: "/webzine/news".into(),
                    param: "n".into(),
                    numeric: true,
                }],
            },
            SiteConfig {
                host: "gametoc.co.kr".into(),
                label: "게임톡".into(),
                general_interest: false,
                rules: vec![SiteRule::RequireParam {
                    prefix: "/news/articleView.html".into(),
                    param: "idxno".into(),
                    numeric: true,
                }],
            },
            SiteConfig {
                host: "gameple.co.kr".into(),
                label: "게임플".into(),
                general_interest: false,
                rules: vec![SiteRule::RequireParam {
                    prefix: "/news/articleView.html".into(),
                    param: "idxno".into(),
                    numeric: true,
                }],
            },
            SiteConfig {
                host: "zdnet.co.kr".into(),
                label: "ZDNet Korea".into(),
                general_interest: true,
                rules: vec![SiteRule::RequireParam {
                    prefix: "/view".into(),
                    param: "no".into(),
                    numeric: true,
                }],
            },
            SiteConfig {
                host: "ddaily.co.kr".into(),
                label: "디지털데일리".into(),
                general_interest: true,
                rules: vec![SiteRule::RequireParam {
                    prefix: "/news/articleView.html".into(),
                    param: "idxno".into(),
                    numeric: true,
                }],
            },
        ];

        let keywords = KeywordConfig {
            primary: [
                "신작", "성과", "호재", "악재", "리스크", "정책", "업데이트", "출시", "매출",
                "순위", "소송", "규제", "CBT", "OBT", "인수", "투자", "M&A",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
            widened: ["게임사", "게임업계", "신규 게임", "확률형 아이템", "게임 심의"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            context_terms: ["게임", "게임사", "게임업계", "모바일게임", "콘솔", "PC게임"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            relevance_terms: [
                "게임", "게이머", "e스포츠", "모바일게임", "콘솔", "스팀", "넥슨", "엔씨",
                "크래프톤",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
        };

        let entity = EntityConfig {
            variants: ["넥슨", "넥슨코리아", "Nexon"]
                .into_iter()
                .map(str::to_string)
                .collect(),
        };

        let mut weights = BTreeMap::new();
        for (term, w) in [
            ("인수", 5),
            ("M&A", 5),
            ("합병", 5),
            ("소송", 4),
            ("규제", 4),
            ("투자", 4),
            ("매출", 3),
            ("실적", 3),
            ("순위", 2),
            ("신작", 2),
            ("출시", 2),
            ("CBT", 1),
            ("OBT", 1),
            ("업데이트", 1),
        ] {
            weights.insert(term.to_string(), w);
        }

        Self {
            sites,
            keywords,
            entity,
            scoring: ScoringConfig {
                weights,
                entity_bonus: default_entity_bonus(),
            },
            limits: LimitConfig::default(),
            aggregator_hosts: default_aggregator_hosts(),
            title_blockers: default_title_blockers(),
        }
    }
}
