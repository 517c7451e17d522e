//! Interface layer - External interfaces
//!
//! This layer handles the telephony webhook, the JSON API and request/response
//! formatting.

pub mod api;
