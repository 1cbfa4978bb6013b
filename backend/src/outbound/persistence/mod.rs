//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Adapters translate between Diesel row structs and domain entities and
//! hold no ledger rules. Row structs (`models.rs`) and the table
//! definitions (`schema.rs`) stay private to this module.
//!
//! Connections come from a `bb8` pool driven by `diesel-async`. Every
//! change set is written inside one transaction, and every guarded update
//! that matches no row aborts it with a conflict.
//!
//! # Example
//!
//! ```ignore
//! use advance_ledger::outbound::persistence::{DbPool, DieselLedgerRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/ledger")).await?;
//! let ledger = DieselLedgerRepository::new(pool);
//! ```

mod diesel_error_mapping;
mod diesel_ledger_repository;
mod diesel_ledger_unit_of_work;
mod diesel_notification_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_ledger_repository::DieselLedgerRepository;
pub use diesel_ledger_unit_of_work::DieselLedgerUnitOfWork;
pub use diesel_notification_repository::DieselNotificationRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
