//! Reservation date.
//!
//! Understands ISO dates, relative terms (today, tomorrow, the day after),
//! weekday names, "day month" and "month day" phrases and numeric D/M[/Y].
//! Dates without a year that already passed roll over to the next year;
//! an explicit date in the past is never returned.

use super::correction::{has_correction_cue, resolve, Candidate};
use super::normalize;
use crate::domain::lexicon::{keywords::normalize_phrase, KeywordMatch, LanguagePack};
use chrono::{Datelike, Duration, NaiveDate};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static ISO: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").unwrap());

static NUMERIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,2})\s*[/.\-]\s*(\d{1,2})(?:\s*[/.\-]\s*(\d{4}|\d{2}))?\b").unwrap()
});

pub fn extract_date(utterance: &str, pack: &LanguagePack, today: NaiveDate) -> Option<NaiveDate> {
    let text = normalize(utterance);
    let dates = &pack.dates;
    let mut candidates = Vec::new();

    for caps in ISO.captures_iter(&text) {
        if let Some(date) = iso_date(&caps) {
            let whole = caps.get(0).map(|m| (m.start(), m.end())).unwrap_or_default();
            candidates.push(Candidate::new(date, whole.0, whole.1));
        }
    }

    for caps in NUMERIC.captures_iter(&text) {
        let Some(whole) = caps.get(0) else { continue };
        if let Some(date) = numeric_date(&caps, today) {
            candidates.push(Candidate::new(date, whole.start(), whole.end()));
        }
    }

    for regex in [&dates.day_month, &dates.month_day] {
        for caps in regex.captures_iter(&text) {
            let Some(whole) = caps.get(0) else { continue };
            let day = caps.name("day").and_then(|m| day_number(m.as_str(), pack));
            let month = caps
                .name("month")
                .and_then(|m| dates.months.get(&normalize_phrase(m.as_str())));
            if let Some(date) = day.zip(month).and_then(|(d, m)| upcoming(d, m, today)) {
                candidates.push(Candidate::new(date, whole.start(), whole.end()));
            }
        }
    }

    for m in dates.day_after_tomorrow.find_all(&text) {
        candidates.push(Candidate::new(today + Duration::days(2), m.start, m.end));
    }

    let blocked = dates.not_tomorrow.find_all(&text);
    for m in dates.tomorrow.find_all(&text) {
        if !blocked.iter().any(|b| overlaps(b, &m)) {
            candidates.push(Candidate::new(today + Duration::days(1), m.start, m.end));
        }
    }

    for m in dates.today.find_all(&text) {
        candidates.push(Candidate::new(today, m.start, m.end));
    }

    let next_week = dates.next_week.matches(&text);
    for (m, weekday) in dates.weekdays.find_all(&text) {
        let date = next_weekday(today, weekday, next_week);
        candidates.push(Candidate::new(date, m.start, m.end));
    }

    resolve(candidates, has_correction_cue(&text, pack)).filter(|date| *date >= today)
}

fn overlaps(a: &KeywordMatch, b: &KeywordMatch) -> bool {
    a.start < b.end && b.start < a.end
}

fn iso_date(caps: &Captures<'_>) -> Option<NaiveDate> {
    let year = caps.get(1)?.as_str().parse().ok()?;
    let month = caps.get(2)?.as_str().parse().ok()?;
    let day = caps.get(3)?.as_str().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn day_number(raw: &str, pack: &LanguagePack) -> Option<u32> {
    raw.parse()
        .ok()
        .or_else(|| pack.dates.numbers.get(&normalize_phrase(raw)))
        .filter(|d| (1..=31).contains(d))
}

/// Nearest reading of `D/M[/Y]` that is not in the past: day-month first,
/// then month-day, then (without a year) either of them next year.
fn numeric_date(caps: &Captures<'_>, today: NaiveDate) -> Option<NaiveDate> {
    let a: u32 = caps.get(1)?.as_str().parse().ok()?;
    let b: u32 = caps.get(2)?.as_str().parse().ok()?;

    if let Some(year) = caps.get(3) {
        let year: i32 = year.as_str().parse().ok()?;
        let year = if year < 100 { 2000 + year } else { year };
        return [(b, a), (a, b)]
            .into_iter()
            .filter_map(|(m, d)| NaiveDate::from_ymd_opt(year, m, d))
            .find(|date| *date >= today);
    }

    let this_year = today.year();
    [(this_year, b, a), (this_year, a, b), (this_year + 1, b, a), (this_year + 1, a, b)]
        .into_iter()
        .filter_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d))
        .find(|date| *date >= today)
}

/// This year's date, or next year's when it already passed
fn upcoming(day: u32, month: u32, today: NaiveDate) -> Option<NaiveDate> {
    let date = NaiveDate::from_ymd_opt(today.year(), month, day)?;
    if date < today {
        NaiveDate::from_ymd_opt(today.year() + 1, month, day)
    } else {
        Some(date)
    }
}

/// Next occurrence of a weekday (1 = Monday), never today
fn next_weekday(today: NaiveDate, weekday: u32, next_week: bool) -> NaiveDate {
    let current = today.weekday().number_from_monday() as i64;
    let mut days = weekday as i64 - current;
    if days <= 0 {
        days += 7;
    }
    if next_week && days < 7 {
        days += 7;
    }
    today + Duration::days(days)
}
