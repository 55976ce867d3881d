//! axum route handlers, one module per resource.

pub mod admin;
pub mod brackets;
pub mod candidates;
pub mod events;
pub mod health;
pub mod matches;
