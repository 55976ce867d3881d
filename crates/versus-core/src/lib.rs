//! Core types and trait definitions for Versus bracket battles.
//!
//! This crate is deliberately free of HTTP and database dependencies. It owns
//! the match/vote data model, the [`store::BattleStore`] abstraction, the
//! bracket progression engine and the read-side match selector. Storage
//! backends and transports plug in through traits.

pub mod bracket;
pub mod candidate;
pub mod engine;
pub mod error;
pub mod event;
pub mod matchup;
pub mod selector;
pub mod store;
pub mod vote;

pub use error::{Error, ErrorKind, Result};
