//! Phrase lists compiled into a single word-boundary regex

use regex::Regex;
use std::collections::{HashMap, HashSet};

/// One phrase occurrence inside an utterance (byte offsets into the searched text)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordMatch {
    pub start: usize,
    pub end: usize,
    pub phrase: String,
}

/// A set of phrases matched on word boundaries, longest alternative first.
#[derive(Debug, Clone)]
pub struct KeywordSet {
    phrases: Vec<String>,
    pattern: Option<Regex>,
}

impl KeywordSet {
    pub fn new<I, S>(phrases: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut phrases: Vec<String> = phrases
            .into_iter()
            .map(|p| normalize_phrase(p.as_ref()))
            .filter(|p| !p.is_empty())
            .collect();
        phrases.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));
        phrases.dedup();

        let pattern = if phrases.is_empty() {
            None
        } else {
            let alternatives: Vec<String> = phrases.iter().map(|p| phrase_pattern(p)).collect();
            Some(Regex::new(&format!("(?i)(?:{})", alternatives.join("|")))?)
        };

        Ok(Self { phrases, pattern })
    }

    pub fn empty() -> Self {
        Self {
            phrases: Vec::new(),
            pattern: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    pub fn matches(&self, text: &str) -> bool {
        self.pattern.as_ref().is_some_and(|re| re.is_match(text))
    }

    pub fn find_all(&self, text: &str) -> Vec<KeywordMatch> {
        let Some(re) = &self.pattern else {
            return Vec::new();
        };
        re.find_iter(text)
            .map(|m| KeywordMatch {
                start: m.start(),
                end: m.end(),
                phrase: normalize_phrase(m.as_str()),
            })
            .collect()
    }

    /// Number of different phrases present in `text`
    pub fn count_distinct(&self, text: &str) -> usize {
        self.find_all(text)
            .into_iter()
            .map(|m| m.phrase)
            .collect::<HashSet<_>>()
            .len()
    }
}

/// Phrases mapped to a value, e.g. number words or month names
#[derive(Debug, Clone)]
pub struct KeywordMap<T> {
    set: KeywordSet,
    values: HashMap<String, T>,
}

impl<T: Copy> KeywordMap<T> {
    pub fn new<I, S>(entries: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = (S, T)>,
        S: AsRef<str>,
    {
        let values: HashMap<String, T> = entries
            .into_iter()
            .map(|(k, v)| (normalize_phrase(k.as_ref()), v))
            .filter(|(k, _)| !k.is_empty())
            .collect();
        let set = KeywordSet::new(values.keys())?;
        Ok(Self { set, values })
    }

    pub fn get(&self, phrase: &str) -> Option<T> {
        self.values.get(&normalize_phrase(phrase)).copied()
    }

    pub fn keywords(&self) -> &KeywordSet {
        &self.set
    }

    /// All occurrences with their mapped value
    pub fn find_all(&self, text: &str) -> Vec<(KeywordMatch, T)> {
        self.set
            .find_all(text)
            .into_iter()
            .filter_map(|m| self.get(&m.phrase).map(|v| (m, v)))
            .collect()
    }

    /// Regex alternation of every phrase, for embedding in larger patterns
    pub fn alternation(&self) -> String {
        self.set
            .phrases()
            .iter()
            .map(|p| regex::escape(p).replace(' ', r"\s+"))
            .collect::<Vec<_>>()
            .join("|")
    }
}

/// Lowercase and collapse inner whitespace
pub fn normalize_phrase(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn phrase_pattern(phrase: &str) -> String {
    let body = regex::escape(phrase).replace(' ', r"\s+");
    let starts_word = phrase.chars().next().is_some_and(char::is_alphanumeric);
    let ends_word = phrase.chars().last().is_some_and(char::is_alphanumeric);
    format!(
        "{}{}{}",
        if starts_word { r"\b" } else { "" },
        body,
        if ends_word { r"\b" } else { "" }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_on_word_boundaries() {
        let set = KeywordSet::new(["si", "no"]).unwrap();
        assert!(set.matches("sí o no"));
        assert!(!set.matches("nosotros"));
        assert!(!set.matches("casi"));
    }

    #[test]
    fn test_longest_phrase_wins() {
        let set = KeywordSet::new(["mañana", "pasado mañana"]).unwrap();
        let found = set.find_all("pasado  mañana por favor");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].phrase, "pasado mañana");
        assert_eq!(found[0].start, 0);
    }

    #[test]
    fn test_phrases_ending_in_punctuation() {
        let set = KeywordSet::new(["p.m."]).unwrap();
        assert!(set.matches("at 9 p.m. please"));
    }

    #[test]
    fn test_count_distinct_ignores_repeats() {
        let set = KeywordSet::new(["hola", "mesa"]).unwrap();
        assert_eq!(set.count_distinct("hola hola, una mesa"), 2);
    }

    #[test]
    fn test_keyword_map_values() {
        let map = KeywordMap::new([("cuatro", 4u32), ("catorce", 14u32)]).unwrap();
        let found = map.find_all("somos cuatro, no, catorce");
        let values: Vec<u32> = found.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![4, 14]);
        assert_eq!(map.get("Cuatro"), Some(4));
    }

    #[test]
    fn test_empty_set_never_matches() {
        let set = KeywordSet::empty();
        assert!(set.is_empty());
        assert!(!set.matches("anything"));
        assert!(set.find_all("anything").is_empty());
    }
}
