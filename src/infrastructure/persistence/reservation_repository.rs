//! PostgreSQL implementation of the reservation store

use crate::domain::reservation::{ReservationRecord, ReservationStore, ReservationTransaction};
use crate::domain::shared::{DomainError, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::{debug, error};
use uuid::Uuid;

fn db_error(e: sqlx::Error) -> DomainError {
    error!("Database error: {}", e);
    DomainError::Persistence(format!("Database error: {}", e))
}

pub struct PgReservationStore {
    pool: PgPool,
}

impl PgReservationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Number of reservations stored for a call
    pub async fn count_for_call(&self, call_id: &str) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM reservations WHERE call_id = $1")
            .bind(call_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;
        row.try_get("total").map_err(db_error)
    }
}

#[async_trait]
impl ReservationStore for PgReservationStore {
    async fn begin(&self) -> Result<Box<dyn ReservationTransaction>> {
        let tx = self.pool.begin().await.map_err(db_error)?;
        Ok(Box::new(PgReservationTransaction { tx: Some(tx) }))
    }
}

pub struct PgReservationTransaction {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgReservationTransaction {
    fn open(&mut self) -> Result<&mut Transaction<'static, Postgres>> {
        self.tx
            .as_mut()
            .ok_or_else(|| DomainError::InvalidOperation("transaction already finished".into()))
    }
}

#[async_trait]
impl ReservationTransaction for PgReservationTransaction {
    async fn upsert_customer(&mut self, name: &str, phone: &str) -> Result<Uuid> {
        debug!("Upserting customer with phone {}", phone);
        let tx = self.open()?;

        let row = sqlx::query(
            r#"
            INSERT INTO customers (id, name, phone, created_at, updated_at)
            VALUES ($1, $2, $3, NOW(), NOW())
            ON CONFLICT (phone) DO UPDATE
            SET name = EXCLUDED.name, updated_at = NOW()
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(phone)
        .fetch_one(&mut **tx)
        .await
        .map_err(db_error)?;

        row.try_get("id").map_err(db_error)
    }

    async fn insert_reservation(&mut self, customer_id: Uuid, record: &ReservationRecord) -> Result<()> {
        debug!("Inserting reservation {} for call {}", record.id, record.call_id);
        let tx = self.open()?;

        sqlx::query(
            r#"
            INSERT INTO reservations
            (id, customer_id, call_id, language, party_size, reserved_at,
             customer_name, phone, transcript, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW())
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(customer_id)
        .bind(&record.call_id)
        .bind(record.language.as_str())
        .bind(record.party_size as i16)
        .bind(record.reserved_at())
        .bind(&record.customer_name)
        .bind(&record.phone)
        .bind(&record.transcript)
        .execute(&mut **tx)
        .await
        .map_err(db_error)?;

        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        match self.tx.take() {
            Some(tx) => tx.commit().await.map_err(db_error),
            None => Err(DomainError::InvalidOperation("transaction already finished".into())),
        }
    }

    async fn rollback(&mut self) -> Result<()> {
        match self.tx.take() {
            Some(tx) => tx.rollback().await.map_err(db_error),
            None => Ok(()),
        }
    }
}
