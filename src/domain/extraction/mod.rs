//! Slot extractors.
//!
//! Each extractor takes the raw utterance and the locked language's pack and
//! returns `None` when nothing usable was said. When several candidates are
//! present the one spoken last wins, see [`correction`].

pub mod correction;
pub mod date;
pub mod name;
pub mod party_size;
pub mod phone;
pub mod time;

pub use date::extract_date;
pub use name::extract_name;
pub use party_size::extract_party_size;
pub use phone::extract_phone;
pub use time::extract_time;

use crate::domain::conversation::{Slot, SlotValue};
use crate::domain::lexicon::Lexicon;
use crate::domain::strategy::{GenerationError, SlotReader, SlotRequest};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Lowercase and blank out punctuation that never carries slot content
pub fn normalize(utterance: &str) -> String {
    utterance
        .to_lowercase()
        .chars()
        .map(|c| match c {
            '¿' | '?' | '¡' | '!' | ',' | ';' | '"' | '«' | '»' | '(' | ')' => ' ',
            other => other,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Rule-based reader over the lexicon; never fails
pub struct RuleSlotReader {
    lexicon: Arc<Lexicon>,
}

impl RuleSlotReader {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self { lexicon }
    }

    pub fn extract(&self, request: &SlotRequest) -> Option<SlotValue> {
        let pack = self.lexicon.pack(request.language);
        let value = match request.slot {
            Slot::People => extract_party_size(&request.utterance, pack).map(SlotValue::People),
            Slot::Date => extract_date(&request.utterance, pack, request.today).map(SlotValue::Date),
            Slot::Time => extract_time(&request.utterance, pack).map(SlotValue::Time),
            Slot::Name => extract_name(&request.utterance, pack).map(SlotValue::Name),
            Slot::Phone => extract_phone(&request.utterance, pack).map(SlotValue::Phone),
        };
        debug!(
            "Rule extraction for {} ({}): {:?}",
            request.slot, request.language, value
        );
        value
    }
}

#[async_trait]
impl SlotReader for RuleSlotReader {
    async fn read(&self, request: &SlotRequest) -> Result<Option<SlotValue>, GenerationError> {
        Ok(self.extract(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::language::Language;
    use chrono::NaiveDate;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("¿Para CUATRO, por favor?"), "para cuatro  por favor");
        assert_eq!(normalize("  21:30 "), "21:30");
    }

    #[tokio::test]
    async fn test_rule_reader_dispatches_by_slot() {
        let reader = RuleSlotReader::new(Arc::new(Lexicon::embedded().unwrap()));
        let today = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let request = SlotRequest::new(Slot::People, "somos seis", Language::Es, today);
        assert_eq!(reader.read(&request).await, Ok(Some(SlotValue::People(6))));

        let request = SlotRequest::new(Slot::Name, "my name is John Smith", Language::En, today);
        assert_eq!(
            reader.read(&request).await,
            Ok(Some(SlotValue::Name("John Smith".into())))
        );
    }
}
