//! Persistence implementations

pub mod memory;
#[cfg(feature = "postgres")]
pub mod database;
#[cfg(feature = "postgres")]
pub mod reservation_repository;

pub use memory::InMemoryReservationStore;
#[cfg(feature = "postgres")]
pub use database::{create_pool, mask_password, run_migrations, DatabaseConfig};
#[cfg(feature = "postgres")]
pub use reservation_repository::PgReservationStore;
