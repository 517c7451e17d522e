//! Response table keys and per-sentiment phrase lists

use crate::domain::sentiment::Sentiment;
use serde::Deserialize;

/// Every prompt the assistant can speak
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKey {
    Welcome,
    OfferHelp,
    StartReservation,
    ClarifyIntention,
    QuestionPeople,
    QuestionDate,
    QuestionTime,
    QuestionName,
    QuestionPhone,
    QuestionPhoneNumber,
    AckPeople,
    AckDate,
    AckTime,
    AckName,
    AckPhone,
    RetryPeople,
    RetryDate,
    RetryTime,
    RetryName,
    RetryPhone,
    RetryPhoneNumber,
    ConfirmSummary,
    ConfirmRetry,
    AskChange,
    Acknowledge,
    Restart,
    Confirmed,
    CancelConfirm,
    CancelRetry,
    Cancelled,
    Resume,
    PersistenceFailed,
    TechnicalError,
    NoInput,
    Goodbye,
}

impl ResponseKey {
    pub const ALL: [ResponseKey; 35] = [
        ResponseKey::Welcome,
        ResponseKey::OfferHelp,
        ResponseKey::StartReservation,
        ResponseKey::ClarifyIntention,
        ResponseKey::QuestionPeople,
        ResponseKey::QuestionDate,
        ResponseKey::QuestionTime,
        ResponseKey::QuestionName,
        ResponseKey::QuestionPhone,
        ResponseKey::QuestionPhoneNumber,
        ResponseKey::AckPeople,
        ResponseKey::AckDate,
        ResponseKey::AckTime,
        ResponseKey::AckName,
        ResponseKey::AckPhone,
        ResponseKey::RetryPeople,
        ResponseKey::RetryDate,
        ResponseKey::RetryTime,
        ResponseKey::RetryName,
        ResponseKey::RetryPhone,
        ResponseKey::RetryPhoneNumber,
        ResponseKey::ConfirmSummary,
        ResponseKey::ConfirmRetry,
        ResponseKey::AskChange,
        ResponseKey::Acknowledge,
        ResponseKey::Restart,
        ResponseKey::Confirmed,
        ResponseKey::CancelConfirm,
        ResponseKey::CancelRetry,
        ResponseKey::Cancelled,
        ResponseKey::Resume,
        ResponseKey::PersistenceFailed,
        ResponseKey::TechnicalError,
        ResponseKey::NoInput,
        ResponseKey::Goodbye,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseKey::Welcome => "welcome",
            ResponseKey::OfferHelp => "offer_help",
            ResponseKey::StartReservation => "start_reservation",
            ResponseKey::ClarifyIntention => "clarify_intention",
            ResponseKey::QuestionPeople => "question_people",
            ResponseKey::QuestionDate => "question_date",
            ResponseKey::QuestionTime => "question_time",
            ResponseKey::QuestionName => "question_name",
            ResponseKey::QuestionPhone => "question_phone",
            ResponseKey::QuestionPhoneNumber => "question_phone_number",
            ResponseKey::AckPeople => "ack_people",
            ResponseKey::AckDate => "ack_date",
            ResponseKey::AckTime => "ack_time",
            ResponseKey::AckName => "ack_name",
            ResponseKey::AckPhone => "ack_phone",
            ResponseKey::RetryPeople => "retry_people",
            ResponseKey::RetryDate => "retry_date",
            ResponseKey::RetryTime => "retry_time",
            ResponseKey::RetryName => "retry_name",
            ResponseKey::RetryPhone => "retry_phone",
            ResponseKey::RetryPhoneNumber => "retry_phone_number",
            ResponseKey::ConfirmSummary => "confirm_summary",
            ResponseKey::ConfirmRetry => "confirm_retry",
            ResponseKey::AskChange => "ask_change",
            ResponseKey::Acknowledge => "acknowledge",
            ResponseKey::Restart => "restart",
            ResponseKey::Confirmed => "confirmed",
            ResponseKey::CancelConfirm => "cancel_confirm",
            ResponseKey::CancelRetry => "cancel_retry",
            ResponseKey::Cancelled => "cancelled",
            ResponseKey::Resume => "resume",
            ResponseKey::PersistenceFailed => "persistence_failed",
            ResponseKey::TechnicalError => "technical_error",
            ResponseKey::NoInput => "no_input",
            ResponseKey::Goodbye => "goodbye",
        }
    }
}

/// Phrasings for one key in one language
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhraseSet {
    pub neutral: Vec<String>,
    pub positive: Vec<String>,
    pub frustrated: Vec<String>,
}

impl PhraseSet {
    /// Sentiment sub-list when present, neutral otherwise
    pub fn for_sentiment(&self, sentiment: Option<Sentiment>) -> &[String] {
        let list = match sentiment {
            Some(Sentiment::Positive) => &self.positive,
            Some(Sentiment::Frustrated) => &self.frustrated,
            Some(Sentiment::Neutral) | None => &self.neutral,
        };
        if list.is_empty() {
            &self.neutral
        } else {
            list
        }
    }
}

/// On-disk shape: either a bare list (neutral) or a table keyed by sentiment
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum PhraseSetFile {
    Plain(Vec<String>),
    Keyed {
        neutral: Vec<String>,
        #[serde(default)]
        positive: Vec<String>,
        #[serde(default)]
        frustrated: Vec<String>,
    },
}

impl From<PhraseSetFile> for PhraseSet {
    fn from(file: PhraseSetFile) -> Self {
        match file {
            PhraseSetFile::Plain(neutral) => PhraseSet {
                neutral,
                ..Default::default()
            },
            PhraseSetFile::Keyed {
                neutral,
                positive,
                frustrated,
            } => PhraseSet {
                neutral,
                positive,
                frustrated,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentiment_falls_back_to_neutral() {
        let set = PhraseSet {
            neutral: vec!["a".into()],
            positive: vec![],
            frustrated: vec!["b".into()],
        };
        assert_eq!(set.for_sentiment(Some(Sentiment::Frustrated)), ["b".to_string()]);
        assert_eq!(set.for_sentiment(Some(Sentiment::Positive)), ["a".to_string()]);
        assert_eq!(set.for_sentiment(None), ["a".to_string()]);
    }

    #[test]
    fn test_key_names_are_unique() {
        let mut names: Vec<&str> = ResponseKey::ALL.iter().map(|k| k.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), ResponseKey::ALL.len());
    }
}
