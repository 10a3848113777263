//! Core types and pure computations for the Blue Crab survey store.
//!
//! No database, file or terminal dependencies. Storage backends implement
//! [`store::RecordStore`]; filtering, sorting and aggregation are pure
//! functions over a slice of [`record::Record`]s.

// Store impls write `async fn` against the `impl Future + Send` declarations.
#![allow(async_fn_in_trait)]

pub mod aggregate;
pub mod dashboard;
pub mod error;
pub mod query;
pub mod record;
pub mod setting;
pub mod store;
pub mod view;

pub use error::{Error, Result};
