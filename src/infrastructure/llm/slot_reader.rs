//! Model-backed slot extraction
//!
//! The model is asked for a small JSON object with one nullable field per
//! slot. Only the requested field is read back, and it goes through the same
//! validation the rule extractors apply before the engine sees it.

use crate::domain::conversation::{Slot, SlotValue};
use crate::domain::language::Language;
use crate::domain::reservation::MIN_NAME_CHARS;
use crate::domain::shared::PhoneNumber;
use crate::domain::strategy::{GenerationError, SlotReader, SlotRequest, TextGenerator};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

const MAX_PARTY_SIZE: u64 = 20;

pub(crate) fn language_name(language: Language) -> &'static str {
    match language {
        Language::Es => "Spanish",
        Language::En => "English",
        Language::De => "German",
        Language::It => "Italian",
        Language::Fr => "French",
        Language::Pt => "Portuguese",
    }
}

#[derive(Debug, Default, Deserialize)]
struct ExtractedSlots {
    people: Option<serde_json::Value>,
    date: Option<String>,
    time: Option<String>,
    name: Option<String>,
    phone: Option<String>,
}

pub struct LlmSlotReader {
    generator: Arc<dyn TextGenerator>,
}

impl LlmSlotReader {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    fn prompt(request: &SlotRequest) -> String {
        format!(
            "You extract restaurant reservation details from a phone caller's words.\n\
             The caller speaks {language}. Today is {today} ({weekday}).\n\
             Answer with a single JSON object and nothing else, using exactly these keys:\n\
             {{\"people\": integer or null, \"date\": \"YYYY-MM-DD\" or null, \
             \"time\": \"HH:MM\" (24h) or null, \"name\": string or null, \"phone\": digits or null}}\n\
             Resolve relative dates against today. Use null for anything not said.\n\
             We are asking for: {slot}.\n\
             Caller: \"{utterance}\"",
            language = language_name(request.language),
            today = request.today.format("%Y-%m-%d"),
            weekday = request.today.format("%A"),
            slot = request.slot,
            utterance = request.utterance.replace('"', "'"),
        )
    }
}

#[async_trait]
impl SlotReader for LlmSlotReader {
    async fn read(&self, request: &SlotRequest) -> Result<Option<SlotValue>, GenerationError> {
        let raw = self.generator.generate(&Self::prompt(request)).await?;
        let extracted = parse_extraction(&raw)?;
        let value = validate(request, extracted)?;
        debug!("LLM read {}: {:?}", request.slot, value);
        Ok(value)
    }
}

/// Drop Markdown code fences some models wrap around JSON
fn strip_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.trim_end().trim_end_matches("```").trim()
}

fn parse_extraction(raw: &str) -> Result<ExtractedSlots, GenerationError> {
    let body = strip_fences(raw);
    if body.is_empty() {
        return Err(GenerationError::Empty);
    }
    serde_json::from_str(body).map_err(|e| GenerationError::Malformed(format!("invalid slot JSON: {e}")))
}

fn malformed(slot: Slot, value: impl std::fmt::Display) -> GenerationError {
    GenerationError::Malformed(format!("invalid {slot}: {value}"))
}

fn validate(request: &SlotRequest, extracted: ExtractedSlots) -> Result<Option<SlotValue>, GenerationError> {
    let slot = request.slot;
    match slot {
        Slot::People => match extracted.people {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(value) => {
                let n = value
                    .as_u64()
                    .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
                    .ok_or_else(|| malformed(slot, &value))?;
                if (1..=MAX_PARTY_SIZE).contains(&n) {
                    Ok(Some(SlotValue::People(n as u8)))
                } else {
                    Err(malformed(slot, n))
                }
            }
        },
        Slot::Date => match non_blank(extracted.date) {
            None => Ok(None),
            Some(raw) => {
                let date = NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| malformed(slot, &raw))?;
                if date < request.today {
                    return Err(malformed(slot, format!("{raw} is in the past")));
                }
                Ok(Some(SlotValue::Date(date)))
            }
        },
        Slot::Time => match non_blank(extracted.time) {
            None => Ok(None),
            Some(raw) => NaiveTime::parse_from_str(&raw, "%H:%M")
                .map(|t| Some(SlotValue::Time(t)))
                .map_err(|_| malformed(slot, &raw)),
        },
        Slot::Name => match non_blank(extracted.name) {
            None => Ok(None),
            Some(name) if name.chars().count() >= MIN_NAME_CHARS => Ok(Some(SlotValue::Name(name))),
            Some(name) => Err(malformed(slot, name)),
        },
        Slot::Phone => match non_blank(extracted.phone) {
            None => Ok(None),
            Some(raw) => PhoneNumber::parse(&raw)
                .map(|phone| Some(SlotValue::Phone(phone.as_str().to_string())))
                .map_err(|_| malformed(slot, &raw)),
        },
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
