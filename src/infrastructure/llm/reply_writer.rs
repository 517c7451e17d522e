//! Model-backed reply rephrasing

use super::slot_reader::language_name;
use crate::domain::strategy::{GenerationError, ReplyDraft, ReplyWriter, TextGenerator};
use async_trait::async_trait;
use std::sync::Arc;

/// Longest reply we are willing to speak
pub const MAX_REPLY_WORDS: usize = 25;
const FORBIDDEN_CHARS: &[char] = &['<', '>', '{', '}', '*', '#'];

pub struct LlmReplyWriter {
    generator: Arc<dyn TextGenerator>,
}

impl LlmReplyWriter {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    fn prompt(draft: &ReplyDraft) -> String {
        format!(
            "You are the phone host of a restaurant taking a table reservation.\n\
             Rewrite the reply below as one natural spoken sentence of at most 15 words, in {language}.\n\
             Conversation step: {step}. Caller mood: {sentiment}.\n\
             Keep every number, date, time and name exactly as given. Plain text only.\n\
             Reply: {text}",
            language = language_name(draft.language),
            step = draft.step,
            sentiment = draft.sentiment.as_str(),
            text = draft.text,
        )
    }
}

#[async_trait]
impl ReplyWriter for LlmReplyWriter {
    async fn write(&self, draft: &ReplyDraft) -> Result<String, GenerationError> {
        let raw = self.generator.generate(&Self::prompt(draft)).await?;
        check_reply(&raw)
    }
}

/// Accept only a short single-line plain-text reply
fn check_reply(raw: &str) -> Result<String, GenerationError> {
    let reply = raw.trim().trim_matches('"').trim();
    if reply.is_empty() {
        return Err(GenerationError::Empty);
    }
    if reply.lines().count() > 1 {
        return Err(GenerationError::Malformed("reply spans several lines".into()));
    }
    if reply.split_whitespace().count() > MAX_REPLY_WORDS {
        return Err(GenerationError::Malformed("reply is too long".into()));
    }
    if reply.contains(FORBIDDEN_CHARS) {
        return Err(GenerationError::Malformed("reply contains markup".into()));
    }
    Ok(reply.to_string())
}
