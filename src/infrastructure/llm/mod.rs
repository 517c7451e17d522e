//! Generative model adapters

pub mod gemini;
pub mod reply_writer;
pub mod slot_reader;

pub use gemini::GeminiClient;
pub use reply_writer::LlmReplyWriter;
pub use slot_reader::LlmSlotReader;
