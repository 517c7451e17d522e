//! Two-tier strategies: a generative primary with a rule-based fallback.
//!
//! The conversation engine never talks to a language model directly. It reads
//! slots through a [`SlotReader`] and polishes replies through a
//! [`ReplyWriter`]; [`with_fallback`] pairs a model-backed implementation
//! with the deterministic one so a failure, a timeout or an empty answer
//! silently falls through to the lexicon tables.

use crate::domain::conversation::{Slot, SlotValue, Step};
use crate::domain::language::Language;
use crate::domain::sentiment::Sentiment;
use async_trait::async_trait;
use chrono::NaiveDate;
use metrics::counter;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_PRIMARY_TIMEOUT: Duration = Duration::from_secs(4);

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Generation timed out")]
    Timeout,

    #[error("Malformed output: {0}")]
    Malformed(String),

    #[error("Empty output")]
    Empty,
}

/// Text-in, text-out generative model
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// What the engine wants read out of one caller utterance
#[derive(Debug, Clone, PartialEq)]
pub struct SlotRequest {
    pub slot: Slot,
    pub utterance: String,
    pub language: Language,
    pub today: NaiveDate,
}

impl SlotRequest {
    pub fn new(slot: Slot, utterance: impl Into<String>, language: Language, today: NaiveDate) -> Self {
        Self {
            slot,
            utterance: utterance.into(),
            language,
            today,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SlotReader: Send + Sync {
    /// `Ok(None)` means the utterance does not contain the slot
    async fn read(&self, request: &SlotRequest) -> Result<Option<SlotValue>, GenerationError>;
}

/// A reply already chosen from the tables, offered for rephrasing
#[derive(Debug, Clone, PartialEq)]
pub struct ReplyDraft {
    pub step: Step,
    pub language: Language,
    pub sentiment: Sentiment,
    pub text: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReplyWriter: Send + Sync {
    async fn write(&self, draft: &ReplyDraft) -> Result<String, GenerationError>;
}

/// Speaks the table reply unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct TableReplyWriter;

#[async_trait]
impl ReplyWriter for TableReplyWriter {
    async fn write(&self, draft: &ReplyDraft) -> Result<String, GenerationError> {
        Ok(draft.text.clone())
    }
}

pub struct WithFallback<P, F> {
    primary: P,
    fallback: F,
    timeout: Duration,
    stage: &'static str,
}

/// Try `primary` first and use `fallback` whenever it cannot answer
pub fn with_fallback<P, F>(primary: P, fallback: F) -> WithFallback<P, F> {
    WithFallback {
        primary,
        fallback,
        timeout: DEFAULT_PRIMARY_TIMEOUT,
        stage: "generative",
    }
}

impl<P, F> WithFallback<P, F> {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Label used in logs and the `generative_fallbacks_total` counter
    pub fn stage(mut self, stage: &'static str) -> Self {
        self.stage = stage;
        self
    }

    fn fell_back(&self, reason: &str) {
        warn!("{} primary strategy fell back: {}", self.stage, reason);
        counter!("generative_fallbacks_total", "stage" => self.stage).increment(1);
    }
}

#[async_trait]
impl<P: SlotReader, F: SlotReader> SlotReader for WithFallback<P, F> {
    async fn read(&self, request: &SlotRequest) -> Result<Option<SlotValue>, GenerationError> {
        match tokio::time::timeout(self.timeout, self.primary.read(request)).await {
            Ok(Ok(Some(value))) => return Ok(Some(value)),
            Ok(Ok(None)) => debug!("{} primary found no {}", self.stage, request.slot),
            Ok(Err(e)) => self.fell_back(&e.to_string()),
            Err(_) => self.fell_back(&GenerationError::Timeout.to_string()),
        }
        self.fallback.read(request).await
    }
}

#[async_trait]
impl<P: ReplyWriter, F: ReplyWriter> ReplyWriter for WithFallback<P, F> {
    async fn write(&self, draft: &ReplyDraft) -> Result<String, GenerationError> {
        match tokio::time::timeout(self.timeout, self.primary.write(draft)).await {
            Ok(Ok(text)) if !text.trim().is_empty() => return Ok(text),
            Ok(Ok(_)) => self.fell_back(&GenerationError::Empty.to_string()),
            Ok(Err(e)) => self.fell_back(&e.to_string()),
            Err(_) => self.fell_back(&GenerationError::Timeout.to_string()),
        }
        self.fallback.write(draft).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> SlotRequest {
        SlotRequest::new(
            Slot::People,
            "somos cuatro",
            Language::Es,
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
        )
    }

    fn draft() -> ReplyDraft {
        ReplyDraft {
            step: Step::AskDate,
            language: Language::Es,
            sentiment: Sentiment::Neutral,
            text: "¿Para qué día?".to_string(),
        }
    }

    #[tokio::test]
    async fn test_primary_answer_is_used() {
        let mut primary = MockSlotReader::new();
        primary
            .expect_read()
            .returning(|_| Ok(Some(SlotValue::People(4))));
        let mut fallback = MockSlotReader::new();
        fallback.expect_read().never();

        let reader = with_fallback(primary, fallback);
        assert_eq!(reader.read(&request()).await, Ok(Some(SlotValue::People(4))));
    }

    #[tokio::test]
    async fn test_primary_error_falls_back() {
        let mut primary = MockSlotReader::new();
        primary
            .expect_read()
            .returning(|_| Err(GenerationError::Transport("503".into())));
        let mut fallback = MockSlotReader::new();
        fallback
            .expect_read()
            .times(1)
            .returning(|_| Ok(Some(SlotValue::People(4))));

        let reader = with_fallback(primary, fallback).stage("slot_reader");
        assert_eq!(reader.read(&request()).await, Ok(Some(SlotValue::People(4))));
    }

    #[tokio::test]
    async fn test_primary_miss_falls_back() {
        let mut primary = MockSlotReader::new();
        primary.expect_read().returning(|_| Ok(None));
        let mut fallback = MockSlotReader::new();
        fallback.expect_read().returning(|_| Ok(None));

        let reader = with_fallback(primary, fallback);
        assert_eq!(reader.read(&request()).await, Ok(None));
    }

    struct SlowWriter;

    #[async_trait]
    impl ReplyWriter for SlowWriter {
        async fn write(&self, _draft: &ReplyDraft) -> Result<String, GenerationError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("demasiado tarde".to_string())
        }
    }

    #[tokio::test]
    async fn test_slow_primary_times_out() {
        let writer = with_fallback(SlowWriter, TableReplyWriter).timeout(Duration::from_millis(20));
        assert_eq!(writer.write(&draft()).await, Ok("¿Para qué día?".to_string()));
    }

    #[tokio::test]
    async fn test_blank_rephrasing_falls_back() {
        let mut primary = MockReplyWriter::new();
        primary.expect_write().returning(|_| Ok("   ".to_string()));
        let writer = with_fallback(primary, TableReplyWriter);
        assert_eq!(writer.write(&draft()).await, Ok("¿Para qué día?".to_string()));
    }
}
