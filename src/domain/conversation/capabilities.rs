//! Optional dialogue features, switched per deployment

use serde::{Deserialize, Serialize};

/// Which parts of the dialogue are enabled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    /// Ask "how can I help" before collecting slots
    pub intention_step: bool,
    /// Read the reservation back and wait for a yes before saving
    pub final_confirmation: bool,
    /// Recognize "I want to cancel" during slot collection
    pub cancellation: bool,
    /// Try the generative model before the rule-based path
    pub generative: bool,
}

impl Capabilities {
    /// Shortest flow: straight to slot collection, save once the phone is known
    pub fn express() -> Self {
        Self {
            intention_step: false,
            final_confirmation: false,
            ..Self::default()
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            intention_step: true,
            final_confirmation: true,
            cancellation: true,
            generative: false,
        }
    }
}
