//! # Abatedouro Database Crate
//!
//! Persistence for processing days and their derived metrics.
//!
//! - `AbateStore`: the storage seam used by the web server and the recalculator.
//! - `PgAbateStore`: PostgreSQL implementation. Each record and its metrics are kept
//!   as JSONB documents, with the filterable fields duplicated as indexed columns.
//! - `MemoryAbateStore`: in-process implementation for tests and database-less runs.
//! - `ProductStore`: the product catalog and its price history, with the same
//!   PostgreSQL and in-memory implementations.
//! - `connect` / `run_migrations`: pool setup and schema management.

pub mod connection;
pub mod error;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

pub use connection::{connect, run_migrations};
pub use error::DbError;
pub use memory::{MemoryAbateStore, MemoryProductStore};
pub use models::{AbateFilter, PriceChange, Product, ProductFilter, StoredAbate};
pub use postgres::{PgAbateStore, PgProductStore};
pub use store::{AbateStore, ProductStore};
