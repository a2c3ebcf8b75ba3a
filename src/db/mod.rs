//! Database module: the cloud receipts collection.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows and conversions
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `sqlite.rs`: pool setup and queries

pub mod models;
pub mod schema;
pub mod sqlite;

pub use models::DbReceipt;
pub use schema::SQLITE_INIT;
pub use sqlite::{ReceiptsStorage, SqlitePool};
