//! SQLite backend for the Blue Crab record store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on one dedicated
//! connection thread without blocking the async runtime.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::{DEFAULT_DB_PATH, SqliteStore};
