//! Handlers for `/brackets` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/brackets` | Voter. Body: `{"candidate_ids":[4 ids]}` |
//! | `GET`  | `/brackets/{id}` | Derived bracket view |
//! | `GET`  | `/brackets/{id}/active` | Open matches, semifinals first |
//! | `GET`  | `/brackets/{id}/completed` | Closed matches by closure time |
//! | `POST` | `/brackets/{id}/synthesize-final` | Admin |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use versus_core::{
  bracket::{BracketView, FinalSynthesis},
  matchup::Match,
  store::BattleStore,
};

use crate::{
  AppState,
  auth::{Admin, Voter},
  error::ApiError,
  extract::{JsonBody, Path},
};

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub candidate_ids: Vec<String>,
}

/// `POST /brackets`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Voter(voter): Voter,
  JsonBody(body): JsonBody<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: BattleStore + Clone + 'static,
{
  let seeded = state.engine.create_semifinals(&body.candidate_ids).await?;
  tracing::info!(bracket_id = %seeded.bracket_id, by = %voter.username, "bracket seeded");
  Ok((StatusCode::CREATED, Json(seeded)))
}

// ─── Reads ───────────────────────────────────────────────────────────────────

/// `GET /brackets/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(bracket_id): Path<String>,
) -> Result<Json<BracketView>, ApiError>
where
  S: BattleStore + Clone + 'static,
{
  Ok(Json(state.engine.bracket(&bracket_id).await?))
}

/// `GET /brackets/{id}/active`
pub async fn active<S>(
  State(state): State<AppState<S>>,
  Path(bracket_id): Path<String>,
) -> Result<Json<Vec<Match>>, ApiError>
where
  S: BattleStore + Clone + 'static,
{
  Ok(Json(state.engine.selector().active_matches(&bracket_id).await?))
}

/// `GET /brackets/{id}/completed`
pub async fn completed<S>(
  State(state): State<AppState<S>>,
  Path(bracket_id): Path<String>,
) -> Result<Json<Vec<Match>>, ApiError>
where
  S: BattleStore + Clone + 'static,
{
  Ok(Json(state.engine.selector().completed_matches(&bracket_id).await?))
}

// ─── Final synthesis ─────────────────────────────────────────────────────────

/// `POST /brackets/{id}/synthesize-final`
pub async fn synthesize_final<S>(
  State(state): State<AppState<S>>,
  Admin(_): Admin,
  Path(bracket_id): Path<String>,
) -> Result<Json<FinalSynthesis>, ApiError>
where
  S: BattleStore + Clone + 'static,
{
  Ok(Json(state.engine.synthesize_final_if_ready(&bracket_id).await?))
}
