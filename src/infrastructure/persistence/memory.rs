//! In-memory reservation store for tests and database-less runs

use crate::domain::reservation::{ReservationRecord, ReservationStore, ReservationTransaction};
use crate::domain::shared::{DomainError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct StoredCustomer {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
}

#[derive(Default)]
struct MemoryState {
    customers: HashMap<String, StoredCustomer>,
    reservations: Vec<(Uuid, ReservationRecord)>,
}

/// Writes become visible only on commit
#[derive(Clone, Default)]
pub struct InMemoryReservationStore {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryReservationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn reservations(&self) -> Vec<ReservationRecord> {
        let state = self.state.lock().await;
        state.reservations.iter().map(|(_, r)| r.clone()).collect()
    }

    pub async fn customer(&self, phone: &str) -> Option<StoredCustomer> {
        self.state.lock().await.customers.get(phone).cloned()
    }

    pub async fn customer_count(&self) -> usize {
        self.state.lock().await.customers.len()
    }
}

#[async_trait]
impl ReservationStore for InMemoryReservationStore {
    async fn begin(&self) -> Result<Box<dyn ReservationTransaction>> {
        Ok(Box::new(InMemoryTransaction {
            state: self.state.clone(),
            customers: Vec::new(),
            reservations: Vec::new(),
            finished: false,
        }))
    }
}

pub struct InMemoryTransaction {
    state: Arc<Mutex<MemoryState>>,
    customers: Vec<StoredCustomer>,
    reservations: Vec<(Uuid, ReservationRecord)>,
    finished: bool,
}

impl InMemoryTransaction {
    fn ensure_open(&self) -> Result<()> {
        if self.finished {
            return Err(DomainError::InvalidOperation("transaction already finished".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ReservationTransaction for InMemoryTransaction {
    async fn upsert_customer(&mut self, name: &str, phone: &str) -> Result<Uuid> {
        self.ensure_open()?;
        let existing = self.state.lock().await.customers.get(phone).map(|c| c.id);
        let id = existing
            .or_else(|| self.customers.iter().find(|c| c.phone == phone).map(|c| c.id))
            .unwrap_or_else(Uuid::new_v4);
        self.customers.retain(|c| c.phone != phone);
        self.customers.push(StoredCustomer {
            id,
            name: name.to_string(),
            phone: phone.to_string(),
        });
        Ok(id)
    }

    async fn insert_reservation(&mut self, customer_id: Uuid, record: &ReservationRecord) -> Result<()> {
        self.ensure_open()?;
        let duplicate = self
            .state
            .lock()
            .await
            .reservations
            .iter()
            .any(|(_, r)| r.id == record.id);
        if duplicate {
            return Err(DomainError::Persistence(format!(
                "reservation {} already exists",
                record.id
            )));
        }
        self.reservations.push((customer_id, record.clone()));
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.finished = true;
        let mut state = self.state.lock().await;
        for customer in self.customers.drain(..) {
            state.customers.insert(customer.phone.clone(), customer);
        }
        state.reservations.append(&mut self.reservations);
        debug!("In-memory transaction committed");
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.finished = true;
        self.customers.clear();
        self.reservations.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::language::Language;
    use crate::domain::reservation::persist_reservation;
    use crate::domain::shared::ReservationId;
    use chrono::{NaiveDate, NaiveTime};

    fn record(phone: &str, name: &str) -> ReservationRecord {
        ReservationRecord {
            id: ReservationId::new(),
            call_id: "CA1".into(),
            language: Language::Es,
            party_size: 2,
            date: NaiveDate::from_ymd_opt(2025, 1, 16).unwrap(),
            time: NaiveTime::from_hms_opt(21, 0, 0).unwrap(),
            customer_name: name.into(),
            phone: phone.into(),
            transcript: String::new(),
        }
    }

    #[tokio::test]
    async fn test_commit_makes_writes_visible() {
        let store = InMemoryReservationStore::new();
        persist_reservation(&store, &record("612345678", "Ana")).await.unwrap();
        assert_eq!(store.reservations().await.len(), 1);
        assert_eq!(store.customer("612345678").await.unwrap().name, "Ana");
    }

    #[tokio::test]
    async fn test_customer_upsert_by_phone() {
        let store = InMemoryReservationStore::new();
        persist_reservation(&store, &record("612345678", "Ana")).await.unwrap();
        persist_reservation(&store, &record("612345678", "Ana María")).await.unwrap();
        assert_eq!(store.customer_count().await, 1);
        assert_eq!(store.customer("612345678").await.unwrap().name, "Ana María");
        assert_eq!(store.reservations().await.len(), 2);
    }

    #[tokio::test]
    async fn test_rollback_discards_everything() {
        let store = InMemoryReservationStore::new();
        let mut tx = store.begin().await.unwrap();
        let customer = tx.upsert_customer("Ana", "612345678").await.unwrap();
        tx.insert_reservation(customer, &record("612345678", "Ana")).await.unwrap();
        tx.rollback().await.unwrap();

        assert!(store.reservations().await.is_empty());
        assert_eq!(store.customer_count().await, 0);
        assert!(tx.commit().await.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_reservation_rolls_back_customer() {
        let store = InMemoryReservationStore::new();
        let first = record("612345678", "Ana");
        persist_reservation(&store, &first).await.unwrap();

        let mut again = first.clone();
        again.customer_name = "Otra".into();
        again.phone = "699999999".into();
        assert!(persist_reservation(&store, &again).await.is_err());
        assert!(store.customer("699999999").await.is_none());
        assert_eq!(store.reservations().await.len(), 1);
    }
}
