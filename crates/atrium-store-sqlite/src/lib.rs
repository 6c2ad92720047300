//! SQLite backend for Atrium accounts.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::{MAX_SLUG_ATTEMPTS, SqliteStore};

#[cfg(test)]
mod tests;
