//! Reservation record and the persistence port

use crate::domain::conversation::CallSession;
use crate::domain::language::Language;
use crate::domain::shared::{DomainError, PhoneNumber, ReservationId, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

pub const MIN_NAME_CHARS: usize = 2;

/// A fully collected reservation, ready to be stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservationRecord {
    pub id: ReservationId,
    pub call_id: String,
    pub language: Language,
    pub party_size: u8,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub customer_name: String,
    pub phone: String,
    pub transcript: String,
}

impl ReservationRecord {
    /// Build the record from a session whose five slots are filled
    pub fn from_session(session: &CallSession, transcript: String) -> Result<Self> {
        let slots = session.slots();
        let missing = |slot: &str| {
            DomainError::InvalidOperation(format!(
                "call {} has no {} yet",
                session.call_id(),
                slot
            ))
        };

        let record = Self {
            id: ReservationId::new(),
            call_id: session.call_id().to_string(),
            language: session.language().unwrap_or_default(),
            party_size: slots.party_size.ok_or_else(|| missing("party size"))?,
            date: slots.date.ok_or_else(|| missing("date"))?,
            time: slots.time.ok_or_else(|| missing("time"))?,
            customer_name: slots.name.clone().ok_or_else(|| missing("name"))?,
            phone: slots.phone.clone().ok_or_else(|| missing("phone"))?,
            transcript,
        };
        record.validate()?;
        Ok(record)
    }

    pub fn validate(&self) -> Result<()> {
        if self.party_size == 0 {
            return Err(DomainError::ValidationError(
                "party size must be at least 1".into(),
            ));
        }
        if self.customer_name.trim().chars().count() < MIN_NAME_CHARS {
            return Err(DomainError::ValidationError(format!(
                "customer name '{}' is too short",
                self.customer_name
            )));
        }
        PhoneNumber::parse(&self.phone)?;
        Ok(())
    }

    pub fn reserved_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }
}

/// Storage for reservations; every write happens inside a transaction
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReservationStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn ReservationTransaction>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReservationTransaction: Send {
    /// Insert or update the customer keyed by phone, returning its id
    async fn upsert_customer(&mut self, name: &str, phone: &str) -> Result<Uuid>;

    async fn insert_reservation(&mut self, customer_id: Uuid, record: &ReservationRecord) -> Result<()>;

    async fn commit(&mut self) -> Result<()>;

    async fn rollback(&mut self) -> Result<()>;
}

/// Upsert the customer and insert the reservation atomically
pub async fn persist_reservation(
    store: &dyn ReservationStore,
    record: &ReservationRecord,
) -> Result<ReservationId> {
    let mut tx = store.begin().await?;

    let written = async {
        let customer_id = tx.upsert_customer(&record.customer_name, &record.phone).await?;
        tx.insert_reservation(customer_id, record).await
    }
    .await;

    match written {
        Ok(()) => {
            tx.commit().await?;
            info!(
                "Reservation {} stored for call {} ({} people at {})",
                record.id,
                record.call_id,
                record.party_size,
                record.reserved_at()
            );
            Ok(record.id)
        }
        Err(e) => {
            error!("Failed to store reservation for call {}: {}", record.call_id, e);
            if let Err(rollback_err) = tx.rollback().await {
                error!("Rollback failed for call {}: {}", record.call_id, rollback_err);
            }
            Err(e)
        }
    }
}
