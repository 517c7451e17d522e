//! Spoken replies.
//!
//! Every reply is picked at random from the phrasings the lexicon holds for a
//! [`ResponseKey`] in the call's language, avoiding the previous prompt so a
//! retry never repeats itself word for word.

pub mod format;

pub use format::{render, slot_vars, speak_date, speak_phone, speak_time};

use crate::domain::language::Language;
use crate::domain::lexicon::{Lexicon, ResponseKey};
use crate::domain::sentiment::Sentiment;
use rand::seq::SliceRandom;
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub struct ResponseSelector {
    lexicon: Arc<Lexicon>,
}

impl ResponseSelector {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self { lexicon }
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn select(&self, key: ResponseKey, language: Language, sentiment: Option<Sentiment>) -> String {
        self.select_avoiding(key, language, sentiment, None)
    }

    /// Random phrasing that does not appear in `avoid`. Falls back to the
    /// full list when every phrasing was already used.
    pub fn select_avoiding(
        &self,
        key: ResponseKey,
        language: Language,
        sentiment: Option<Sentiment>,
        avoid: Option<&str>,
    ) -> String {
        let phrases = self.lexicon.phrases(key, language, sentiment);
        if phrases.is_empty() {
            warn!("No phrasings for {} in {}", key.as_str(), language);
            return String::new();
        }

        let fresh: Vec<&String> = phrases
            .iter()
            .filter(|p| avoid.map_or(true, |previous| !previous.contains(p.as_str())))
            .collect();

        let mut rng = rand::thread_rng();
        let picked = if fresh.is_empty() {
            phrases.choose(&mut rng)
        } else {
            fresh.choose(&mut rng).copied()
        };
        picked.cloned().unwrap_or_default()
    }
}
