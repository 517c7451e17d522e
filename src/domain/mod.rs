//! Domain layer - Core business logic and rules
//!
//! This layer contains:
//! - The call session state machine and its slots
//! - Language lexicons, detection and sentiment
//! - Slot extractors and intent classifiers
//! - Response selection and the generative strategy seams
//! - The reservation record and its storage port

pub mod conversation;
pub mod extraction;
pub mod intent;
pub mod language;
pub mod lexicon;
pub mod reservation;
pub mod response;
pub mod sentiment;
pub mod shared;
pub mod strategy;
pub mod transcript;

// Re-export commonly used types
pub use shared::{DomainError, Result};
