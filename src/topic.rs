// src/topic.rs
//! Entity gate and importance scoring for the topic-specific section.
//!
//! Query provenance is never trusted: an article belongs to the topic track
//! only if an entity-name variant appears verbatim in its own title/snippet.

use crate::config::DigestConfig;

pub struct TopicScorer {
    variants: Vec<String>,
    weights: Vec<(String, i32)>,
    entity_bonus: i32,
}

impl TopicScorer {
    pub fn new(cfg: &DigestConfig) -> Self {
        Self {
            variants: cfg
                .entity
                .variants
                .iter()
                .map(|v| v.to_lowercase())
                .collect(),
            weights: cfg
                .scoring
                .weights
                .iter()
                .map(|(k, w)| (k.to_lowercase(), *w))
                .collect(),
            entity_bonus: cfg.scoring.entity_bonus,
        }
    }

    /// Case-insensitive substring match of any entity variant over
    /// title+snippet. The mandatory gate for the topic section.
    pub fn mentions_entity(&self, title: &str, snippet: &str) -> bool {
        let haystack = format!("{title} {snippet}").to_lowercase();
        self.variants.iter().any(|v| haystack.contains(v.as_str()))
    }

    /// Weighted keyword hits plus the entity bonus. Used only to rank and cap
    /// the topic subsection.
    pub fn importance(&self, title: &str, snippet: &str) -> i32 {
        let haystack = format!("{title} {snippet}").to_lowercase();
        let mut score: i32 = self
            .weights
            .iter()
            .filter(|(term, _)| haystack.contains(term.as_str()))
            .map(|(_, w)| *w)
            .sum();
        if self.mentions_entity(title, snippet) {
            score += self.entity_bonus;
        }
        score
    }
}
