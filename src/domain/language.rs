//! Supported call languages and first-utterance language detection

use super::lexicon::Lexicon;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Languages the assistant can hold a conversation in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Es,
    En,
    De,
    It,
    Fr,
    Pt,
}

impl Language {
    /// Detection order; earlier languages win nothing on ties, the default does.
    pub const ALL: [Language; 6] = [
        Language::Es,
        Language::En,
        Language::De,
        Language::It,
        Language::Fr,
        Language::Pt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Es => "es",
            Language::En => "en",
            Language::De => "de",
            Language::It => "it",
            Language::Fr => "fr",
            Language::Pt => "pt",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "es" => Some(Language::Es),
            "en" => Some(Language::En),
            "de" => Some(Language::De),
            "it" => Some(Language::It),
            "fr" => Some(Language::Fr),
            "pt" => Some(Language::Pt),
            _ => None,
        }
    }

    /// Position in [`Language::ALL`]
    pub fn index(&self) -> usize {
        match self {
            Language::Es => 0,
            Language::En => 1,
            Language::De => 2,
            Language::It => 3,
            Language::Fr => 4,
            Language::Pt => 5,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Scores an utterance against every language's detection keywords.
pub struct LanguageDetector<'a> {
    lexicon: &'a Lexicon,
}

impl<'a> LanguageDetector<'a> {
    pub fn new(lexicon: &'a Lexicon) -> Self {
        Self { lexicon }
    }

    /// Language with the most distinct keyword hits. Ties and no hits fall
    /// back to the lexicon's default language.
    pub fn detect(&self, utterance: &str) -> Language {
        let text = utterance.to_lowercase();
        let default = self.lexicon.default_language();

        let mut best = default;
        let mut best_score = 0usize;
        let mut tied = false;

        for language in Language::ALL {
            let score = self.lexicon.pack(language).detection.count_distinct(&text);
            if score > best_score {
                best = language;
                best_score = score;
                tied = false;
            } else if score == best_score && score > 0 {
                tied = true;
            }
        }

        let detected = if best_score == 0 || tied { default } else { best };
        debug!(
            "Language detection: {} (score {}, tied: {})",
            detected, best_score, tied
        );
        detected
    }
}
