//! SQLite backend for Versus.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every compound operation runs inside a
//! single `BEGIN IMMEDIATE` transaction on that one connection, which is what
//! makes vote commits, closures and final synthesis atomic.

mod encode;
mod ops;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
