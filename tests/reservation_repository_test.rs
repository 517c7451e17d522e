//! Reservation Repository Integration Tests

#![cfg(feature = "postgres")]

use chrono::{NaiveDate, NaiveTime};
use mesa::domain::language::Language;
use mesa::domain::reservation::{persist_reservation, ReservationRecord, ReservationStore};
use mesa::domain::shared::ReservationId;
use mesa::infrastructure::persistence::{create_pool, run_migrations, DatabaseConfig, PgReservationStore};
use sqlx::{PgPool, Row};

fn record(call_id: &str, name: &str, phone: &str) -> ReservationRecord {
    ReservationRecord {
        id: ReservationId::new(),
        call_id: call_id.to_string(),
        language: Language::Es,
        party_size: 4,
        date: NaiveDate::from_ymd_opt(2030, 5, 10).unwrap(),
        time: NaiveTime::from_hms_opt(21, 0, 0).unwrap(),
        customer_name: name.to_string(),
        phone: phone.to_string(),
        transcript: "# Call test".to_string(),
    }
}

#[tokio::test]
#[ignore] // Requires database
async fn test_persist_reservation_and_customer() {
    let pool = setup_database().await;
    let store = PgReservationStore::new(pool.clone());

    let saved = record("test-call-1", "Marta", "600111222");
    let id = persist_reservation(&store, &saved).await.expect("Failed to persist");
    assert_eq!(id, saved.id);
    assert_eq!(store.count_for_call("test-call-1").await.unwrap(), 1);

    let row = sqlx::query(
        "SELECT r.party_size, r.reserved_at, c.name FROM reservations r JOIN customers c ON c.id = r.customer_id WHERE r.id = $1",
    )
    .bind(saved.id.as_uuid())
    .fetch_one(&pool)
    .await
    .unwrap();
    let party: i16 = row.get("party_size");
    let reserved_at: chrono::NaiveDateTime = row.get("reserved_at");
    let name: String = row.get("name");
    assert_eq!(party, 4);
    assert_eq!(reserved_at, saved.reserved_at());
    assert_eq!(name, "Marta");

    cleanup_database(pool).await;
}

#[tokio::test]
#[ignore] // Requires database
async fn test_customer_is_upserted_by_phone() {
    let pool = setup_database().await;
    let store = PgReservationStore::new(pool.clone());

    persist_reservation(&store, &record("test-call-2", "Marta", "600333444")).await.unwrap();
    persist_reservation(&store, &record("test-call-3", "Marta López", "600333444")).await.unwrap();

    let row = sqlx::query("SELECT COUNT(*) AS total, MAX(name) AS name FROM customers WHERE phone = $1")
        .bind("600333444")
        .fetch_one(&pool)
        .await
        .unwrap();
    let total: i64 = row.get("total");
    let name: String = row.get("name");
    assert_eq!(total, 1);
    assert_eq!(name, "Marta López");

    cleanup_database(pool).await;
}

#[tokio::test]
#[ignore] // Requires database
async fn test_rollback_leaves_nothing_behind() {
    let pool = setup_database().await;
    let store = PgReservationStore::new(pool.clone());

    let mut tx = store.begin().await.unwrap();
    let customer = tx.upsert_customer("Ana", "600555666").await.unwrap();
    tx.insert_reservation(customer, &record("test-call-4", "Ana", "600555666"))
        .await
        .unwrap();
    tx.rollback().await.unwrap();

    assert_eq!(store.count_for_call("test-call-4").await.unwrap(), 0);
    let row = sqlx::query("SELECT COUNT(*) AS total FROM customers WHERE phone = $1")
        .bind("600555666")
        .fetch_one(&pool)
        .await
        .unwrap();
    let total: i64 = row.get("total");
    assert_eq!(total, 0);

    cleanup_database(pool).await;
}

// Helper functions

async fn setup_database() -> PgPool {
    let config = DatabaseConfig::from_env();
    let pool = create_pool(&config).await.expect("Failed to create pool");
    run_migrations(&pool).await.expect("Failed to run migrations");
    cleanup_tables(&pool).await;
    pool
}

async fn cleanup_tables(pool: &PgPool) {
    sqlx::query("DELETE FROM reservations WHERE call_id LIKE 'test-call-%'")
        .execute(pool)
        .await
        .ok();
    sqlx::query("DELETE FROM customers WHERE phone IN ('600111222', '600333444', '600555666')")
        .execute(pool)
        .await
        .ok();
}

async fn cleanup_database(pool: PgPool) {
    cleanup_tables(&pool).await;
    pool.close().await;
}
