//! Infrastructure layer - Technical implementations
//!
//! This layer contains:
//! - Reservation storage (Postgres and in-memory)
//! - Session storage
//! - Generative model adapters
//! - Telephony document rendering

pub mod llm;
pub mod persistence;
pub mod session;
pub mod telephony;
