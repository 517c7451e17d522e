//! Dialogue steps

use super::slots::Slot;
use serde::{Deserialize, Serialize};
use std::fmt;

/// State of the reservation dialogue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    #[default]
    Greeting,
    AskIntention,
    AskPeople,
    AskDate,
    AskTime,
    AskName,
    /// Use the calling number or give another one
    AskPhone,
    AskPhoneNumber,
    Confirm,
    Cancelling,
    Complete,
    Finished,
    Cancelled,
    /// Hung up on a caller who stopped answering
    Abandoned,
    Error,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Greeting => "greeting",
            Step::AskIntention => "ask_intention",
            Step::AskPeople => "ask_people",
            Step::AskDate => "ask_date",
            Step::AskTime => "ask_time",
            Step::AskName => "ask_name",
            Step::AskPhone => "ask_phone",
            Step::AskPhoneNumber => "ask_phone_number",
            Step::Confirm => "confirm",
            Step::Cancelling => "cancelling",
            Step::Complete => "complete",
            Step::Finished => "finished",
            Step::Cancelled => "cancelled",
            Step::Abandoned => "abandoned",
            Step::Error => "error",
        }
    }

    /// No further utterances are processed
    pub fn is_terminal(&self) -> bool {
        matches!(self, Step::Finished | Step::Cancelled | Step::Abandoned | Step::Error)
    }

    /// Steps from which the caller may ask to cancel
    pub fn is_cancellable(&self) -> bool {
        matches!(
            self,
            Step::AskIntention
                | Step::AskPeople
                | Step::AskDate
                | Step::AskTime
                | Step::AskName
                | Step::AskPhone
                | Step::AskPhoneNumber
                | Step::Confirm
        )
    }

    /// Step that asks for `slot`
    pub fn asking(slot: Slot) -> Self {
        match slot {
            Slot::People => Step::AskPeople,
            Slot::Date => Step::AskDate,
            Slot::Time => Step::AskTime,
            Slot::Name => Step::AskName,
            Slot::Phone => Step::AskPhone,
        }
    }

    /// Slot collected by this step
    pub fn slot(&self) -> Option<Slot> {
        match self {
            Step::AskPeople => Some(Slot::People),
            Step::AskDate => Some(Slot::Date),
            Step::AskTime => Some(Slot::Time),
            Step::AskName => Some(Slot::Name),
            Step::AskPhone | Step::AskPhoneNumber => Some(Slot::Phone),
            _ => None,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_steps() {
        assert!(Step::Finished.is_terminal());
        assert!(Step::Cancelled.is_terminal());
        assert!(Step::Abandoned.is_terminal());
        assert!(Step::Error.is_terminal());
        assert!(!Step::Complete.is_terminal());
        assert!(!Step::Cancelling.is_terminal());
    }

    #[test]
    fn test_cancellable_steps() {
        assert!(Step::AskDate.is_cancellable());
        assert!(Step::Confirm.is_cancellable());
        assert!(!Step::Greeting.is_cancellable());
        assert!(!Step::Cancelling.is_cancellable());
        assert!(!Step::Finished.is_cancellable());
    }

    #[test]
    fn test_slot_mapping() {
        for slot in Slot::ORDER {
            assert_eq!(Step::asking(slot).slot(), Some(slot));
        }
        assert_eq!(Step::AskPhoneNumber.slot(), Some(Slot::Phone));
        assert_eq!(Step::Confirm.slot(), None);
    }
}
