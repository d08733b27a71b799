//! SQLite backend for the organizations directory.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Geodesic distance, polygon coverage and
//! Unicode case folding are registered as SQL functions on the connection, so
//! spatial and name filters are evaluated inside the query alongside paging.

mod encode;
mod schema;
mod spatial;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
