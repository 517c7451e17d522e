//! Application layer - Use cases and application services
//!
//! The conversation engine lives here: it loads the call session, runs the
//! step handler for the current step and persists the finished reservation.

pub mod dialogue;

pub use dialogue::{ConversationEngine, TurnRequest, TurnResponse};
