//! Reservation time.
//!
//! Hours come from digits ("21:30", "9.15", "21h", "9 30") or hour words.
//! Spoken quarter and half modifiers adjust hours given without minutes, and
//! a period cue next to the hour moves it to the afternoon or midnight.

use super::correction::{has_correction_cue, resolve, Candidate};
use super::normalize;
use crate::domain::lexicon::{KeywordSet, LanguagePack, ModifierPosition, TimeModifier};
use chrono::NaiveTime;
use once_cell::sync::Lazy;
use regex::Regex;

static DIGITAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})(?:\s*[:.h]\s*(\d{2})|\s+(\d{2}))?").unwrap());

#[derive(Debug, Clone, Copy)]
struct RawTime {
    hour: u32,
    minute: Option<u32>,
    /// Hour words are twelve-hour clock readings
    spoken: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Period {
    Morning,
    Afternoon,
    Night,
}

pub fn extract_time(utterance: &str, pack: &LanguagePack) -> Option<NaiveTime> {
    let text = normalize(utterance);
    let mut raw = Vec::new();

    for caps in DIGITAL.captures_iter(&text) {
        let Some(whole) = caps.get(0) else { continue };
        if touches_digits_or_date(&text, whole.start(), whole.end()) {
            continue;
        }
        let Some(hour) = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok()) else {
            continue;
        };
        let minute = caps
            .get(2)
            .or_else(|| caps.get(3))
            .and_then(|m| m.as_str().parse::<u32>().ok());
        raw.push(Candidate::new(
            RawTime {
                hour,
                minute,
                spoken: false,
            },
            whole.start(),
            whole.end(),
        ));
    }

    for (m, hour) in pack.times.hours.find_all(&text) {
        raw.push(Candidate::new(
            RawTime {
                hour,
                minute: None,
                spoken: true,
            },
            m.start,
            m.end,
        ));
    }

    raw.sort_by_key(|c| c.start);

    let mut candidates = Vec::new();
    for (i, candidate) in raw.iter().enumerate() {
        let before_start = if i == 0 { 0 } else { raw[i - 1].end.min(candidate.start) };
        let after_end = raw.get(i + 1).map_or(text.len(), |next| next.start.max(candidate.end));
        let before = &text[before_start..candidate.start];
        let after = &text[candidate.end..after_end];

        if let Some(time) = settle(candidate.value, before, after, pack) {
            candidates.push(Candidate::new(time, candidate.start, candidate.end));
        }
    }

    resolve(candidates, has_correction_cue(&text, pack))
}

/// Apply modifiers and period cues from the text around one candidate
fn settle(raw: RawTime, before: &str, after: &str, pack: &LanguagePack) -> Option<NaiveTime> {
    let mut hour = raw.hour;
    let mut minute = raw.minute.unwrap_or(0);

    if raw.minute.is_none() {
        if let Some(modifier) = pack
            .times
            .modifiers
            .iter()
            .find(|m| modifier_applies(m, before, after))
        {
            minute = modifier.minute;
            hour = shift_hour(hour, modifier.hour_offset);
        }
    }

    // Padding lets "9pm" match a cue that needs a word boundary
    let after = format!(" {} ", after);
    let before = format!(" {} ", before);
    let period = period_in(&after, pack).or_else(|| period_in(&before, pack));
    match period {
        Some(Period::Afternoon) if hour < 12 => hour += 12,
        Some(Period::Night) if hour < 12 => hour += 12,
        Some(Period::Night) if hour == 12 => hour = 0,
        Some(Period::Morning) if hour == 12 => hour = 0,
        None if raw.spoken && hour == 0 => hour = 12,
        _ => {}
    }

    if hour > 23 || minute > 59 {
        return None;
    }
    NaiveTime::from_hms_opt(hour, minute, 0)
}

fn modifier_applies(modifier: &TimeModifier, before: &str, after: &str) -> bool {
    match modifier.position {
        ModifierPosition::After => {
            let segment = after.trim_start();
            modifier
                .phrases
                .find_all(segment)
                .first()
                .is_some_and(|m| m.start == 0)
        }
        ModifierPosition::Before => {
            let segment = before.trim_end();
            modifier
                .phrases
                .find_all(segment)
                .last()
                .is_some_and(|m| m.end == segment.len())
        }
    }
}

fn shift_hour(hour: u32, offset: i32) -> u32 {
    let shifted = hour as i32 + offset;
    if shifted < 0 {
        23
    } else if shifted == 0 && hour <= 12 {
        12
    } else {
        shifted as u32
    }
}

fn period_in(segment: &str, pack: &LanguagePack) -> Option<Period> {
    let any = |set: &KeywordSet| set.matches(segment);
    if any(&pack.times.pm) || any(&pack.times.evening) {
        Some(Period::Afternoon)
    } else if any(&pack.times.night) {
        Some(Period::Night)
    } else if any(&pack.times.am) {
        Some(Period::Morning)
    } else {
        None
    }
}

/// Part of a longer number, or one half of a date such as "20/03"
fn touches_digits_or_date(text: &str, start: usize, end: usize) -> bool {
    let next = text[end..].chars().next();
    let prev = text[..start].chars().next_back();
    matches!(next, Some(c) if c.is_ascii_digit() || c == '/')
        || matches!(prev, Some(c) if c == '/' || c == '-')
}
