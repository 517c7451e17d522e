//! Intent classifiers over the locked language's keyword lists
//!
//! All checks are whole-word and case-insensitive.

use crate::domain::conversation::Slot;
use crate::domain::extraction::normalize;
use crate::domain::lexicon::LanguagePack;
use serde::{Deserialize, Serialize};

/// Answer to "do you want to cancel?"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelAnswer {
    Yes,
    No,
    Unclear,
}

/// Answer to the final summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationReply {
    Confirm,
    Change(Slot),
    Restart,
    Deny,
    Unclear,
}

/// Answer to "shall we use the number you are calling from?"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhoneChoice {
    Same,
    Other,
    Unclear,
}

pub fn is_greeting(utterance: &str, pack: &LanguagePack) -> bool {
    pack.intents.greeting.matches(&normalize(utterance))
}

pub fn is_reservation_request(utterance: &str, pack: &LanguagePack) -> bool {
    let text = normalize(utterance);
    pack.intents.reservation.matches(&text)
        || pack
            .intents
            .reservation_patterns
            .iter()
            .any(|p| p.is_match(&text))
}

pub fn is_cancellation_request(utterance: &str, pack: &LanguagePack) -> bool {
    let text = normalize(utterance);
    pack.intents.cancellation.matches(&text)
        || pack
            .intents
            .cancellation_patterns
            .iter()
            .any(|p| p.is_match(&text))
}

pub fn is_affirmative(utterance: &str, pack: &LanguagePack) -> bool {
    pack.intents.affirmative.matches(&normalize(utterance))
}

pub fn is_negative(utterance: &str, pack: &LanguagePack) -> bool {
    pack.intents.negative.matches(&normalize(utterance))
}

/// First slot named in the utterance, in booking order
pub fn mentioned_slot(utterance: &str, pack: &LanguagePack) -> Option<Slot> {
    let text = normalize(utterance);
    Slot::ORDER
        .into_iter()
        .find(|slot| pack.intents.slots.for_slot(*slot).matches(&text))
}

/// A restated cancellation wins, then refusals, so "no, no quiero cancelar"
/// never cancels
pub fn classify_cancel_answer(utterance: &str, pack: &LanguagePack) -> CancelAnswer {
    let text = normalize(utterance);
    let restated = pack.intents.cancellation_patterns.iter().any(|p| p.is_match(&text));
    if restated {
        CancelAnswer::Yes
    } else if pack.intents.cancel_deny.matches(&text) {
        CancelAnswer::No
    } else if pack.intents.cancel_confirm.matches(&text) {
        CancelAnswer::Yes
    } else {
        CancelAnswer::Unclear
    }
}

pub fn classify_confirmation(utterance: &str, pack: &LanguagePack) -> ConfirmationReply {
    let text = normalize(utterance);
    let intents = &pack.intents;

    if intents.restart.matches(&text) {
        return ConfirmationReply::Restart;
    }
    let slot = mentioned_slot(&text, pack);
    let negative = intents.negative.matches(&text);
    if let Some(slot) = slot {
        if negative || intents.change.matches(&text) {
            return ConfirmationReply::Change(slot);
        }
    }
    if negative {
        return ConfirmationReply::Deny;
    }
    if intents.affirmative.matches(&text) {
        return ConfirmationReply::Confirm;
    }
    match slot {
        Some(slot) => ConfirmationReply::Change(slot),
        None => ConfirmationReply::Unclear,
    }
}

/// "Other" wins over "same" so "no, otro" is never read as agreement
pub fn classify_phone_choice(utterance: &str, pack: &LanguagePack) -> PhoneChoice {
    let text = normalize(utterance);
    if pack.intents.other_number.matches(&text) {
        PhoneChoice::Other
    } else if pack.intents.same_number.matches(&text) {
        PhoneChoice::Same
    } else {
        PhoneChoice::Unclear
    }
}
