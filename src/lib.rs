//! Mesa - A telephone reservation assistant for restaurants
//!
//! Callers book a table by talking to the assistant over the phone. Each call
//! is a small state machine that locks the caller's language, collects the
//! reservation details and stores the result together with a transcript.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interface;

// Re-export commonly used types
pub use domain::shared::error::DomainError;
pub use domain::shared::result::Result;
