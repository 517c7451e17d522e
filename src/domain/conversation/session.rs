//! Call session: step, locked language, slots and transcript

use super::slots::{Slot, SlotValue, Slots};
use super::step::Step;
use crate::domain::language::Language;
use crate::domain::shared::{DomainError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who spoke a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Caller,
    Assistant,
}

impl Speaker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Speaker::Caller => "caller",
            Speaker::Assistant => "assistant",
        }
    }
}

/// One transcript entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Conversation state for one phone call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallSession {
    call_id: String,
    caller_number: Option<String>,
    step: Step,
    language: Option<Language>,
    slots: Slots,
    history: Vec<Turn>,
    /// Step that was active when the caller asked to cancel
    suspended_step: Option<Step>,
    last_prompt: Option<String>,
    misses: u32,
    /// Consecutive turns without any speech
    #[serde(default)]
    silences: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CallSession {
    pub fn new(call_id: impl Into<String>, caller_number: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            call_id: call_id.into(),
            caller_number: caller_number.filter(|n| !n.trim().is_empty()),
            step: Step::Greeting,
            language: None,
            slots: Slots::default(),
            history: Vec::new(),
            suspended_step: None,
            last_prompt: None,
            misses: 0,
            silences: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    /// Number the call comes from, when the transport knows it
    pub fn caller_number(&self) -> Option<&str> {
        self.caller_number.as_deref()
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn language(&self) -> Option<Language> {
        self.language
    }

    pub fn slots(&self) -> &Slots {
        &self.slots
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    pub fn suspended_step(&self) -> Option<Step> {
        self.suspended_step
    }

    pub fn last_prompt(&self) -> Option<&str> {
        self.last_prompt.as_deref()
    }

    pub fn misses(&self) -> u32 {
        self.misses
    }

    pub fn silences(&self) -> u32 {
        self.silences
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_finished(&self) -> bool {
        self.step.is_terminal()
    }

    /// Lock the call language. The first language wins for the rest of the call.
    pub fn lock_language(&mut self, language: Language) -> Language {
        *self.language.get_or_insert(language)
    }

    /// Move to `next`, refusing to leave a terminal step or to reach
    /// `Complete` while a slot is still empty.
    pub fn transition_to(&mut self, next: Step) -> Result<()> {
        if self.step.is_terminal() && next != self.step {
            return Err(DomainError::InvalidStateTransition(format!(
                "{} is terminal, cannot move to {}",
                self.step, next
            )));
        }
        if next == Step::Complete {
            if let Some(missing) = self.slots.first_missing() {
                return Err(DomainError::InvalidStateTransition(format!(
                    "cannot complete reservation without {}",
                    missing
                )));
            }
        }
        self.step = next;
        Ok(())
    }

    /// Force the terminal error step after an internal fault
    pub fn fail(&mut self) {
        self.step = Step::Error;
    }

    pub fn fill(&mut self, value: SlotValue) {
        self.slots.set(value);
        self.misses = 0;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    /// Count a turn in which the caller said nothing; returns the streak
    pub fn record_silence(&mut self) -> u32 {
        self.silences += 1;
        self.silences
    }

    pub fn clear_slots(&mut self) {
        self.slots.clear();
    }

    /// Enter the cancellation sub-flow, remembering where we were
    pub fn suspend(&mut self) -> Result<()> {
        let current = self.step;
        self.transition_to(Step::Cancelling)?;
        self.suspended_step = Some(current);
        Ok(())
    }

    /// Step to continue with after a declined cancellation: the first empty
    /// slot, or the phone question when everything is filled.
    pub fn resume_step(&self) -> Step {
        match self.slots.first_missing() {
            Some(slot) => Step::asking(slot),
            None => Step::asking(Slot::Phone),
        }
    }

    pub fn resume(&mut self) -> Result<Step> {
        let next = self.resume_step();
        self.transition_to(next)?;
        self.suspended_step = None;
        Ok(next)
    }

    pub fn record_caller(&mut self, text: &str, at: DateTime<Utc>) {
        self.history.push(Turn {
            speaker: Speaker::Caller,
            text: text.to_string(),
            timestamp: at,
        });
        self.silences = 0;
        self.updated_at = at;
    }

    pub fn record_assistant(&mut self, text: &str, at: DateTime<Utc>) {
        self.history.push(Turn {
            speaker: Speaker::Assistant,
            text: text.to_string(),
            timestamp: at,
        });
        self.last_prompt = Some(text.to_string());
        self.updated_at = at;
    }
}
