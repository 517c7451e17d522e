//! Per-language dictionaries, phrase lists and response tables.
//!
//! The packs live as TOML under `lexicon/` and are embedded in the binary.
//! A directory with `<code>.toml` files can replace individual languages at
//! startup without rebuilding.

pub mod keywords;
pub mod pack;
pub mod responses;

pub use keywords::{KeywordMap, KeywordMatch, KeywordSet};
pub use pack::{LanguagePack, ModifierPosition, TimeModifier, VoiceProfile};
pub use responses::{PhraseSet, ResponseKey};

use crate::domain::language::Language;
use crate::domain::sentiment::Sentiment;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

const EMBEDDED: [(Language, &str); 6] = [
    (Language::Es, include_str!("../../../lexicon/es.toml")),
    (Language::En, include_str!("../../../lexicon/en.toml")),
    (Language::De, include_str!("../../../lexicon/de.toml")),
    (Language::It, include_str!("../../../lexicon/it.toml")),
    (Language::Fr, include_str!("../../../lexicon/fr.toml")),
    (Language::Pt, include_str!("../../../lexicon/pt.toml")),
];

/// Minimum phrasings per key so consecutive prompts can differ
pub const MIN_PHRASINGS: usize = 3;

#[derive(Debug, Error)]
pub enum LexiconError {
    #[error("Failed to parse {language} lexicon: {source}")]
    Parse {
        language: String,
        source: toml::de::Error,
    },

    #[error("Invalid pattern in {language} lexicon: {source}")]
    Pattern {
        language: String,
        source: regex::Error,
    },

    #[error("Invalid {language} lexicon: {reason}")]
    Invalid { language: String, reason: String },

    #[error("Failed to read lexicon file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// All language packs, indexed by [`Language::index`]
#[derive(Debug, Clone)]
pub struct Lexicon {
    default: Language,
    packs: Vec<LanguagePack>,
}

impl Lexicon {
    /// Packs compiled into the binary
    pub fn embedded() -> Result<Self, LexiconError> {
        Self::load(None, Language::default())
    }

    /// Load packs, preferring `<dir>/<code>.toml` over the embedded copy.
    pub fn load(dir: Option<&Path>, default: Language) -> Result<Self, LexiconError> {
        let mut packs = Vec::with_capacity(EMBEDDED.len());

        for (language, embedded) in EMBEDDED {
            let override_path = dir.map(|d| d.join(format!("{}.toml", language)));
            let pack = match override_path {
                Some(path) if path.exists() => {
                    let source =
                        std::fs::read_to_string(&path).map_err(|e| LexiconError::Io {
                            path: path.display().to_string(),
                            source: e,
                        })?;
                    info!("Loading {} lexicon from {}", language, path.display());
                    LanguagePack::from_toml(language, &source)?
                }
                _ => LanguagePack::from_toml(language, embedded)?,
            };
            packs.push(pack);
        }

        let lexicon = Self { default, packs };
        lexicon.validate()?;
        Ok(lexicon)
    }

    fn validate(&self) -> Result<(), LexiconError> {
        let default_pack = self.pack(self.default);
        for key in ResponseKey::ALL {
            if default_pack.phrases(key, None).is_empty() {
                return Err(LexiconError::Invalid {
                    language: self.default.to_string(),
                    reason: format!("default language has no phrasing for '{}'", key.as_str()),
                });
            }
        }

        for pack in &self.packs {
            for key in ResponseKey::ALL {
                let count = pack.phrases(key, None).len();
                if count > 0 && count < MIN_PHRASINGS {
                    warn!(
                        "Lexicon {}: '{}' has only {} phrasing(s)",
                        pack.language,
                        key.as_str(),
                        count
                    );
                }
            }
        }
        Ok(())
    }

    pub fn default_language(&self) -> Language {
        self.default
    }

    pub fn pack(&self, language: Language) -> &LanguagePack {
        &self.packs[language.index()]
    }

    /// Phrasings for `key` in `language`, falling back to the default language
    /// when that language has none.
    pub fn phrases(
        &self,
        key: ResponseKey,
        language: Language,
        sentiment: Option<Sentiment>,
    ) -> &[String] {
        let phrases = self.pack(language).phrases(key, sentiment);
        if phrases.is_empty() {
            self.pack(self.default).phrases(key, sentiment)
        } else {
            phrases
        }
    }
}
