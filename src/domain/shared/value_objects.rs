//! Shared value objects

use super::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Reservation identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReservationId(Uuid);

impl ReservationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ReservationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Minimum number of digits a callback number must carry
pub const MIN_PHONE_DIGITS: usize = 9;

/// Callback phone number, stored as digits with an optional leading `+`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Normalize a phone number written with spaces, dashes, dots or parentheses.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::ValidationError("phone number is empty".into()));
        }

        let allowed = |c: char| c.is_ascii_digit() || " -+().".contains(c);
        if !trimmed.chars().all(allowed) {
            return Err(DomainError::ValidationError(format!(
                "phone number contains invalid characters: {}",
                trimmed
            )));
        }

        let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.len() < MIN_PHONE_DIGITS {
            return Err(DomainError::ValidationError(format!(
                "phone number needs at least {} digits",
                MIN_PHONE_DIGITS
            )));
        }

        if trimmed.starts_with('+') {
            Ok(Self(format!("+{}", digits)))
        } else {
            Ok(Self(digits))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Digits only, without the international prefix sign
    pub fn digits(&self) -> &str {
        self.0.trim_start_matches('+')
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
