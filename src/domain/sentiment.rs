//! Rule-based caller sentiment

use super::lexicon::LanguagePack;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Consecutive extraction misses after which the caller is treated as frustrated
pub const FRUSTRATION_MISSES: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    #[default]
    Neutral,
    Positive,
    Frustrated,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Neutral => "neutral",
            Sentiment::Positive => "positive",
            Sentiment::Frustrated => "frustrated",
        }
    }

    /// Tag an utterance. Explicit frustration cues win over courtesy words,
    /// and repeated misses escalate a neutral caller.
    pub fn tag(utterance: &str, pack: &LanguagePack, consecutive_misses: u32) -> Self {
        let text = utterance.to_lowercase();
        if pack.sentiment.frustrated.matches(&text) {
            Sentiment::Frustrated
        } else if consecutive_misses >= FRUSTRATION_MISSES {
            Sentiment::Frustrated
        } else if pack.sentiment.positive.matches(&text) {
            Sentiment::Positive
        } else {
            Sentiment::Neutral
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::language::Language;
    use crate::domain::lexicon::Lexicon;

    #[test]
    fn test_tags_from_cues() {
        let lexicon = Lexicon::embedded().unwrap();
        let es = lexicon.pack(Language::Es);

        assert_eq!(Sentiment::tag("ya te lo dije, cuatro", es, 0), Sentiment::Frustrated);
        assert_eq!(Sentiment::tag("cuatro, gracias", es, 0), Sentiment::Positive);
        assert_eq!(Sentiment::tag("cuatro", es, 0), Sentiment::Neutral);
    }

    #[test]
    fn test_repeated_misses_escalate() {
        let lexicon = Lexicon::embedded().unwrap();
        let en = lexicon.pack(Language::En);

        assert_eq!(Sentiment::tag("hmm", en, 1), Sentiment::Neutral);
        assert_eq!(Sentiment::tag("hmm", en, 2), Sentiment::Frustrated);
    }
}
