//! Reference texts drawn uniformly at random from a fixed pool.

use rand::seq::IndexedRandom;

use crate::domain::ReferenceTextProvider;

const DEFAULT_TEXTS: [&str; 5] = [
    "The quick brown fox jumps over the lazy dog. Programming is an art that requires patience and dedication.",
    "Technology has transformed the way we live and work. Every day brings new opportunities to learn and grow.",
    "Success comes to those who are willing to put in the effort. Hard work beats talent when talent doesn't work hard.",
    "The future belongs to those who believe in the beauty of their dreams. Never give up on what you want most.",
    "Innovation distinguishes between a leader and a follower. Think different and make a difference in the world.",
];

pub struct RandomTextPool {
    texts: Vec<String>,
}

impl RandomTextPool {
    /// Build a pool from the given texts. Blank entries are skipped; an empty
    /// pool falls back to the default texts.
    pub fn new(texts: Vec<String>) -> Self {
        let texts: Vec<String> = texts
            .into_iter()
            .filter(|t| !t.trim().is_empty())
            .collect();
        if texts.is_empty() {
            return Self::default();
        }
        Self { texts }
    }

    pub fn texts(&self) -> &[String] {
        &self.texts
    }
}

impl Default for RandomTextPool {
    fn default() -> Self {
        Self {
            texts: DEFAULT_TEXTS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl ReferenceTextProvider for RandomTextPool {
    fn next_text(&self) -> String {
        self.texts
            .choose(&mut rand::rng())
            .cloned()
            .unwrap_or_else(|| DEFAULT_TEXTS[0].to_string())
    }
}
