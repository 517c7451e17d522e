//! One language's lexicon: the on-disk TOML shape and its compiled form

use super::keywords::{KeywordMap, KeywordSet};
use super::responses::{PhraseSet, PhraseSetFile, ResponseKey};
use super::LexiconError;
use crate::domain::conversation::Slot;
use crate::domain::language::Language;
use crate::domain::sentiment::Sentiment;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Text-to-speech voice used for a language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceProfile {
    pub voice: String,
    pub locale: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct PackFile {
    language: Language,
    detection: Vec<String>,
    correction_cues: Vec<String>,
    voice: VoiceProfile,
    numbers: HashMap<String, u32>,
    phone_digits: HashMap<String, u32>,
    dates: DatesFile,
    times: TimesFile,
    names: NamesFile,
    intents: IntentsFile,
    sentiment: SentimentFile,
    format: FormatFile,
    responses: HashMap<ResponseKey, PhraseSetFile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DatesFile {
    today: Vec<String>,
    tomorrow: Vec<String>,
    day_after_tomorrow: Vec<String>,
    #[serde(default)]
    not_tomorrow: Vec<String>,
    next_week: Vec<String>,
    #[serde(default)]
    day_connectors: Vec<String>,
    weekdays: HashMap<String, u32>,
    months: HashMap<String, u32>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TimesFile {
    am: Vec<String>,
    pm: Vec<String>,
    evening: Vec<String>,
    #[serde(default)]
    night: Vec<String>,
    hours: HashMap<String, u32>,
    #[serde(default)]
    modifiers: Vec<ModifierFile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ModifierFile {
    phrases: Vec<String>,
    minute: u32,
    #[serde(default)]
    hour_offset: i32,
    position: ModifierPosition,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NamesFile {
    intros: Vec<String>,
    stop_words: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct IntentsFile {
    greeting: Vec<String>,
    reservation: Vec<String>,
    #[serde(default)]
    reservation_patterns: Vec<String>,
    cancellation: Vec<String>,
    #[serde(default)]
    cancellation_patterns: Vec<String>,
    affirmative: Vec<String>,
    negative: Vec<String>,
    restart: Vec<String>,
    change: Vec<String>,
    cancel_confirm: Vec<String>,
    cancel_deny: Vec<String>,
    same_number: Vec<String>,
    other_number: Vec<String>,
    slots: SlotKeywordsFile,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SlotKeywordsFile {
    people: Vec<String>,
    date: Vec<String>,
    time: Vec<String>,
    name: Vec<String>,
    phone: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SentimentFile {
    positive: Vec<String>,
    frustrated: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FormatFile {
    date: String,
    months: Vec<String>,
    person: String,
    people: String,
    digits: Vec<String>,
}

/// Whether a time modifier is spoken after the hour ("nueve y media") or
/// before it ("half past nine")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModifierPosition {
    After,
    Before,
}

/// Minute qualifier such as "y cuarto" or "quarter to"
#[derive(Debug, Clone)]
pub struct TimeModifier {
    pub phrases: KeywordSet,
    pub minute: u32,
    pub hour_offset: i32,
    pub position: ModifierPosition,
}

#[derive(Debug, Clone)]
pub struct DateLexicon {
    pub today: KeywordSet,
    pub tomorrow: KeywordSet,
    pub day_after_tomorrow: KeywordSet,
    /// Phrases containing the word for "tomorrow" that mean "morning"
    pub not_tomorrow: KeywordSet,
    pub next_week: KeywordSet,
    pub weekdays: KeywordMap<u32>,
    pub months: KeywordMap<u32>,
    pub numbers: KeywordMap<u32>,
    /// "10 de octubre", "10th of October"
    pub day_month: Regex,
    /// "October 10th"
    pub month_day: Regex,
}

#[derive(Debug, Clone)]
pub struct TimeLexicon {
    pub am: KeywordSet,
    pub pm: KeywordSet,
    pub evening: KeywordSet,
    /// Like evening, except that twelve means midnight
    pub night: KeywordSet,
    pub hours: KeywordMap<u32>,
    pub modifiers: Vec<TimeModifier>,
}

#[derive(Debug, Clone)]
pub struct NameLexicon {
    pub intros: Vec<Regex>,
    pub stop_words: HashSet<String>,
}

#[derive(Debug, Clone)]
pub struct SlotKeywords {
    pub people: KeywordSet,
    pub date: KeywordSet,
    pub time: KeywordSet,
    pub name: KeywordSet,
    pub phone: KeywordSet,
}

impl SlotKeywords {
    pub fn for_slot(&self, slot: Slot) -> &KeywordSet {
        match slot {
            Slot::People => &self.people,
            Slot::Date => &self.date,
            Slot::Time => &self.time,
            Slot::Name => &self.name,
            Slot::Phone => &self.phone,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IntentLexicon {
    pub greeting: KeywordSet,
    pub reservation: KeywordSet,
    pub reservation_patterns: Vec<Regex>,
    pub cancellation: KeywordSet,
    pub cancellation_patterns: Vec<Regex>,
    pub affirmative: KeywordSet,
    pub negative: KeywordSet,
    pub restart: KeywordSet,
    pub change: KeywordSet,
    pub cancel_confirm: KeywordSet,
    pub cancel_deny: KeywordSet,
    pub same_number: KeywordSet,
    pub other_number: KeywordSet,
    pub slots: SlotKeywords,
}

#[derive(Debug, Clone)]
pub struct SentimentLexicon {
    pub positive: KeywordSet,
    pub frustrated: KeywordSet,
}

/// Data used to speak slot values back to the caller
#[derive(Debug, Clone)]
pub struct FormatLexicon {
    /// Template with `{day}` and `{month}`
    pub date: String,
    pub months: Vec<String>,
    pub person: String,
    pub people: String,
    pub digits: Vec<String>,
}

/// Compiled lexicon for one language
#[derive(Debug, Clone)]
pub struct LanguagePack {
    pub language: Language,
    pub voice: VoiceProfile,
    pub detection: KeywordSet,
    pub correction_cues: KeywordSet,
    pub numbers: KeywordMap<u32>,
    pub phone_digits: KeywordMap<u32>,
    pub dates: DateLexicon,
    pub times: TimeLexicon,
    pub names: NameLexicon,
    pub intents: IntentLexicon,
    pub sentiment: SentimentLexicon,
    pub format: FormatLexicon,
    responses: HashMap<ResponseKey, PhraseSet>,
}

impl LanguagePack {
    /// Parse and compile a TOML pack, checking it declares `expected`.
    pub fn from_toml(expected: Language, source: &str) -> Result<Self, LexiconError> {
        let file: PackFile = toml::from_str(source).map_err(|e| LexiconError::Parse {
            language: expected.to_string(),
            source: e,
        })?;
        if file.language != expected {
            return Err(LexiconError::Invalid {
                language: expected.to_string(),
                reason: format!("file declares language '{}'", file.language),
            });
        }
        compile(file)
    }

    pub fn responses(&self, key: ResponseKey) -> Option<&PhraseSet> {
        self.responses.get(&key)
    }

    /// Phrasings for `key`, possibly empty
    pub fn phrases(&self, key: ResponseKey, sentiment: Option<Sentiment>) -> &[String] {
        self.responses
            .get(&key)
            .map(|set| set.for_sentiment(sentiment))
            .unwrap_or(&[])
    }
}

fn compile(file: PackFile) -> Result<LanguagePack, LexiconError> {
    let language = file.language;
    let code = language.to_string();
    let pattern_err = |e: regex::Error| LexiconError::Pattern {
        language: code.clone(),
        source: e,
    };
    let invalid = |reason: String| LexiconError::Invalid {
        language: code.clone(),
        reason,
    };

    let set = |phrases: &[String]| KeywordSet::new(phrases).map_err(pattern_err);
    let map = |entries: &HashMap<String, u32>| {
        KeywordMap::new(entries.iter().map(|(k, v)| (k.as_str(), *v))).map_err(pattern_err)
    };
    let regexes = |patterns: &[String]| {
        patterns
            .iter()
            .map(|p| Regex::new(&format!("(?i){}", p)).map_err(pattern_err))
            .collect::<Result<Vec<_>, _>>()
    };

    if file.format.months.len() != 12 {
        return Err(invalid(format!(
            "format.months needs 12 entries, found {}",
            file.format.months.len()
        )));
    }
    if file.format.digits.len() != 10 {
        return Err(invalid(format!(
            "format.digits needs 10 entries, found {}",
            file.format.digits.len()
        )));
    }
    if let Some((word, value)) = file.dates.months.iter().find(|(_, v)| !(1..=12).contains(*v)) {
        return Err(invalid(format!("month '{}' maps to {}", word, value)));
    }
    if let Some((word, value)) = file.dates.weekdays.iter().find(|(_, v)| !(1..=7).contains(*v)) {
        return Err(invalid(format!("weekday '{}' maps to {}", word, value)));
    }
    if let Some((word, value)) = file.phone_digits.iter().find(|(_, v)| **v > 9) {
        return Err(invalid(format!("phone digit '{}' maps to {}", word, value)));
    }

    let numbers = map(&file.numbers)?;
    let months = map(&file.dates.months)?;
    let connectors = file
        .dates
        .day_connectors
        .iter()
        .map(|c| regex::escape(c).replace(' ', r"\s+"))
        .collect::<Vec<_>>()
        .join("|");
    let connector_group = if connectors.is_empty() {
        String::new()
    } else {
        format!(r"(?:(?:{})\s+)?", connectors)
    };
    let day = format!(r"(?P<day>\d{{1,2}}|{})", numbers.alternation());
    let day_month = Regex::new(&format!(
        r"(?i)\b{day}(?:st|nd|rd|th|º|ª|°|\.)?\s+{conn}(?P<month>{months})\b",
        day = day,
        conn = connector_group,
        months = months.alternation()
    ))
    .map_err(pattern_err)?;
    let month_day = Regex::new(&format!(
        r"(?i)\b(?P<month>{months})\s+{conn}{day}(?:st|nd|rd|th)?\b",
        day = day,
        conn = connector_group,
        months = months.alternation()
    ))
    .map_err(pattern_err)?;

    let dates = DateLexicon {
        today: set(&file.dates.today)?,
        tomorrow: set(&file.dates.tomorrow)?,
        day_after_tomorrow: set(&file.dates.day_after_tomorrow)?,
        not_tomorrow: set(&file.dates.not_tomorrow)?,
        next_week: set(&file.dates.next_week)?,
        weekdays: map(&file.dates.weekdays)?,
        months,
        numbers: numbers.clone(),
        day_month,
        month_day,
    };

    let modifiers = file
        .times
        .modifiers
        .iter()
        .map(|m| {
            Ok(TimeModifier {
                phrases: set(&m.phrases)?,
                minute: m.minute,
                hour_offset: m.hour_offset,
                position: m.position,
            })
        })
        .collect::<Result<Vec<_>, LexiconError>>()?;

    let times = TimeLexicon {
        am: set(&file.times.am)?,
        pm: set(&file.times.pm)?,
        evening: set(&file.times.evening)?,
        night: set(&file.times.night)?,
        hours: map(&file.times.hours)?,
        modifiers,
    };

    let names = NameLexicon {
        intros: regexes(&file.names.intros)?,
        stop_words: file
            .names
            .stop_words
            .iter()
            .map(|w| w.to_lowercase())
            .collect(),
    };

    let intents_file = &file.intents;
    let intents = IntentLexicon {
        greeting: set(&intents_file.greeting)?,
        reservation: set(&intents_file.reservation)?,
        reservation_patterns: regexes(&intents_file.reservation_patterns)?,
        cancellation: set(&intents_file.cancellation)?,
        cancellation_patterns: regexes(&intents_file.cancellation_patterns)?,
        affirmative: set(&intents_file.affirmative)?,
        negative: set(&intents_file.negative)?,
        restart: set(&intents_file.restart)?,
        change: set(&intents_file.change)?,
        cancel_confirm: set(&intents_file.cancel_confirm)?,
        cancel_deny: set(&intents_file.cancel_deny)?,
        same_number: set(&intents_file.same_number)?,
        other_number: set(&intents_file.other_number)?,
        slots: SlotKeywords {
            people: set(&intents_file.slots.people)?,
            date: set(&intents_file.slots.date)?,
            time: set(&intents_file.slots.time)?,
            name: set(&intents_file.slots.name)?,
            phone: set(&intents_file.slots.phone)?,
        },
    };

    let sentiment = SentimentLexicon {
        positive: set(&file.sentiment.positive)?,
        frustrated: set(&file.sentiment.frustrated)?,
    };

    Ok(LanguagePack {
        language,
        voice: file.voice,
        detection: set(&file.detection)?,
        correction_cues: set(&file.correction_cues)?,
        numbers,
        phone_digits: map(&file.phone_digits)?,
        dates,
        times,
        names,
        intents,
        sentiment,
        format: FormatLexicon {
            date: file.format.date,
            months: file.format.months,
            person: file.format.person,
            people: file.format.people,
            digits: file.format.digits,
        },
        responses: file
            .responses
            .into_iter()
            .map(|(key, phrases)| (key, PhraseSet::from(phrases)))
            .collect(),
    })
}
