//! `GET /health`

use axum::{Json, extract::State};
use chrono::Utc;
use serde_json::{Value, json};
use versus_core::store::BattleStore;

use crate::AppState;

pub async fn handler<S>(State(state): State<AppState<S>>) -> Json<Value>
where
  S: BattleStore + Clone + 'static,
{
  Json(json!({
    "status":         "ok",
    "timestamp":      Utc::now(),
    "vote_threshold": state.config.vote_threshold,
    "subscribers":    state.fanout.subscriber_count(),
  }))
}
