//! Reservation slots collected during a call

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One named field of the reservation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    People,
    Date,
    Time,
    Name,
    Phone,
}

impl Slot {
    /// Collection order
    pub const ORDER: [Slot; 5] = [Slot::People, Slot::Date, Slot::Time, Slot::Name, Slot::Phone];

    pub fn as_str(&self) -> &'static str {
        match self {
            Slot::People => "people",
            Slot::Date => "date",
            Slot::Time => "time",
            Slot::Name => "name",
            Slot::Phone => "phone",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A typed value for one slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotValue {
    People(u8),
    Date(NaiveDate),
    Time(NaiveTime),
    Name(String),
    Phone(String),
}

impl SlotValue {
    pub fn slot(&self) -> Slot {
        match self {
            SlotValue::People(_) => Slot::People,
            SlotValue::Date(_) => Slot::Date,
            SlotValue::Time(_) => Slot::Time,
            SlotValue::Name(_) => Slot::Name,
            SlotValue::Phone(_) => Slot::Phone,
        }
    }
}

impl fmt::Display for SlotValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotValue::People(n) => write!(f, "{}", n),
            SlotValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            SlotValue::Time(t) => write!(f, "{}", t.format("%H:%M")),
            SlotValue::Name(name) => write!(f, "{}", name),
            SlotValue::Phone(phone) => write!(f, "{}", phone),
        }
    }
}

/// Partially filled reservation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slots {
    pub party_size: Option<u8>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub name: Option<String>,
    pub phone: Option<String>,
}

impl Slots {
    pub fn set(&mut self, value: SlotValue) {
        match value {
            SlotValue::People(n) => self.party_size = Some(n),
            SlotValue::Date(d) => self.date = Some(d),
            SlotValue::Time(t) => self.time = Some(t),
            SlotValue::Name(name) => self.name = Some(name),
            SlotValue::Phone(phone) => self.phone = Some(phone),
        }
    }

    pub fn is_filled(&self, slot: Slot) -> bool {
        match slot {
            Slot::People => self.party_size.is_some(),
            Slot::Date => self.date.is_some(),
            Slot::Time => self.time.is_some(),
            Slot::Name => self.name.is_some(),
            Slot::Phone => self.phone.is_some(),
        }
    }

    /// First empty slot in collection order
    pub fn first_missing(&self) -> Option<Slot> {
        Slot::ORDER.into_iter().find(|slot| !self.is_filled(*slot))
    }

    pub fn is_complete(&self) -> bool {
        self.first_missing().is_none()
    }

    pub fn clear(&mut self) {
        *self = Slots::default();
    }
}
