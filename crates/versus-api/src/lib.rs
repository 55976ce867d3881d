//! HTTP and WebSocket surface for Versus.
//!
//! Exposes an axum [`Router`] backed by any [`BattleStore`]. The router owns
//! no state of its own beyond [`AppState`]: the bracket engine, the
//! notification fan-out and the configured accounts.

pub mod auth;
pub mod error;
pub mod extract;
pub mod fanout;
pub mod handlers;

pub use error::ApiError;

use std::{collections::HashSet, num::NonZeroU32, path::PathBuf, sync::Arc};

use argon2::PasswordHash;
use axum::{
  Router,
  routing::{get, post},
};
use serde::Deserialize;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use versus_core::{engine::BracketEngine, store::BattleStore};

use auth::{Account, AuthConfig};
use fanout::Broadcaster;
use handlers::{admin, brackets, candidates, events, health, matches};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `VERSUS_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:               String,
  #[serde(default = "default_port")]
  pub port:               u16,
  #[serde(default = "default_store_path")]
  pub store_path:         PathBuf,
  /// Total votes at which a match closes.
  #[serde(default = "default_vote_threshold")]
  pub vote_threshold:     NonZeroU32,
  /// Events buffered per subscriber before it starts dropping them.
  #[serde(default = "default_broadcast_capacity")]
  pub broadcast_capacity: usize,
  #[serde(default)]
  pub accounts:           Vec<Account>,
}

fn default_host() -> String { "127.0.0.1".into() }

fn default_port() -> u16 { 4000 }

fn default_store_path() -> PathBuf { PathBuf::from("versus.db") }

fn default_vote_threshold() -> NonZeroU32 { NonZeroU32::new(10).unwrap_or(NonZeroU32::MIN) }

fn default_broadcast_capacity() -> usize { 256 }

/// Reasons a [`ServerConfig`] is refused at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
  #[error("broadcast_capacity must be at least 1")]
  ZeroBroadcastCapacity,

  #[error("account #{0} has an empty username")]
  EmptyUsername(usize),

  #[error("username {0:?} contains ':' and could never log in over Basic auth")]
  ColonInUsername(String),

  #[error("username {0:?} is configured more than once")]
  DuplicateUsername(String),

  #[error("password_hash for {username:?} is not an argon2 PHC string: {reason}")]
  InvalidPasswordHash { username: String, reason: String },
}

impl ServerConfig {
  /// Check everything that would otherwise only surface on the first
  /// request: unusable accounts and a zero-sized fan-out buffer.
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.broadcast_capacity == 0 {
      return Err(ConfigError::ZeroBroadcastCapacity);
    }
    let mut seen = HashSet::new();
    for (index, account) in self.accounts.iter().enumerate() {
      let username = account.username.as_str();
      if username.trim().is_empty() {
        return Err(ConfigError::EmptyUsername(index));
      }
      if username.contains(':') {
        return Err(ConfigError::ColonInUsername(username.to_owned()));
      }
      if !seen.insert(username) {
        return Err(ConfigError::DuplicateUsername(username.to_owned()));
      }
      PasswordHash::new(&account.password_hash).map_err(|e| {
        ConfigError::InvalidPasswordHash { username: username.to_owned(), reason: e.to_string() }
      })?;
    }
    Ok(())
  }

  pub fn admin_count(&self) -> usize {
    self.accounts.iter().filter(|a| a.role == auth::Role::Admin).count()
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S> {
  pub engine: Arc<BracketEngine<S, Broadcaster>>,
  pub fanout: Broadcaster,
  pub auth:   Arc<AuthConfig>,
  pub config: Arc<ServerConfig>,
}

impl<S: BattleStore> AppState<S> {
  /// Wire the engine to a fresh broadcaster and take accounts from `config`.
  pub fn new(store: S, config: ServerConfig) -> Self {
    let fanout = Broadcaster::new(config.broadcast_capacity);
    let engine = BracketEngine::new(store, fanout.clone(), config.vote_threshold);
    Self {
      engine: Arc::new(engine),
      fanout,
      auth:   Arc::new(AuthConfig { accounts: config.accounts.clone() }),
      config: Arc::new(config),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the Versus [`Router`].
pub fn router<S>(state: AppState<S>) -> Router
where
  S: BattleStore + Clone + 'static,
{
  Router::new()
    .route("/health",                          get(health::handler::<S>))
    // Brackets
    .route("/brackets",                        post(brackets::create::<S>))
    .route("/brackets/{id}",                   get(brackets::get_one::<S>))
    .route("/brackets/{id}/active",            get(brackets::active::<S>))
    .route("/brackets/{id}/completed",         get(brackets::completed::<S>))
    .route("/brackets/{id}/synthesize-final",  post(brackets::synthesize_final::<S>))
    // Candidates
    .route("/candidates/{id}",                 get(candidates::get_one::<S>))
    // Matches
    .route("/matches/next",                    get(matches::next::<S>))
    .route("/matches/{id}",                    get(matches::get_one::<S>))
    .route("/matches/{id}/vote",               post(matches::vote::<S>))
    .route("/matches/{id}/my-vote",            get(matches::my_vote::<S>))
    // Administration
    .route("/admin/brackets",                  get(admin::list_brackets::<S>))
    .route("/admin/candidates",                post(admin::register_candidate::<S>))
    .route("/admin/matches",                   post(admin::create_match::<S>))
    .route("/admin/matches/{id}",              axum::routing::delete(admin::delete_match::<S>))
    .route("/admin/matches/{id}/reset",        post(admin::reset_match::<S>))
    .route("/admin/brackets/{id}",             axum::routing::delete(admin::delete_bracket::<S>))
    .route("/admin/brackets/{id}/reset",       post(admin::reset_bracket::<S>))
    // Event stream
    .route("/events",                          get(events::handler::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────
