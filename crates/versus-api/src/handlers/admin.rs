//! Handlers for `/admin` endpoints. Every route requires [`Role::Admin`].
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/admin/brackets` | Summaries, newest first |
//! | `POST`   | `/admin/candidates` | Body: `{"candidate_id":..,"author_id":..}` |
//! | `POST`   | `/admin/matches` | Body: `{"bracket_id":..,"candidate_ids":[a,b],"is_final":false}` |
//! | `POST`   | `/admin/matches/{id}/reset` | |
//! | `POST`   | `/admin/brackets/{id}/reset` | |
//! | `DELETE` | `/admin/matches/{id}` | |
//! | `DELETE` | `/admin/brackets/{id}` | |
//!
//! [`Role::Admin`]: crate::auth::Role::Admin

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use versus_core::{
  bracket::BracketSummary,
  candidate::NewCandidate,
  matchup::Match,
  store::BattleStore,
};

use crate::{
  AppState,
  auth::Admin,
  error::ApiError,
  extract::{JsonBody, Path},
};

/// `GET /admin/brackets`
pub async fn list_brackets<S>(
  State(state): State<AppState<S>>,
  Admin(_): Admin,
) -> Result<Json<Vec<BracketSummary>>, ApiError>
where
  S: BattleStore + Clone + 'static,
{
  Ok(Json(state.engine.brackets().await?))
}

/// `POST /admin/candidates`
pub async fn register_candidate<S>(
  State(state): State<AppState<S>>,
  Admin(_): Admin,
  JsonBody(body): JsonBody<NewCandidate>,
) -> Result<impl IntoResponse, ApiError>
where
  S: BattleStore + Clone + 'static,
{
  let candidate = state.engine.register_candidate(body).await?;
  Ok((StatusCode::CREATED, Json(candidate)))
}

// ─── Matches ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateMatchBody {
  pub bracket_id:    String,
  pub candidate_ids: Vec<String>,
  #[serde(default)]
  pub is_final:      bool,
}

/// `POST /admin/matches`
pub async fn create_match<S>(
  State(state): State<AppState<S>>,
  Admin(admin): Admin,
  JsonBody(body): JsonBody<CreateMatchBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: BattleStore + Clone + 'static,
{
  let [candidate_a, candidate_b] = body.candidate_ids.as_slice() else {
    return Err(ApiError::BadRequest(format!(
      "a match needs exactly 2 candidates, got {}",
      body.candidate_ids.len()
    )));
  };
  let created = state
    .engine
    .create_match(&body.bracket_id, candidate_a, candidate_b, body.is_final)
    .await?;
  tracing::info!(match_id = %created.match_id, by = %admin.username, "admin created match");
  Ok((StatusCode::CREATED, Json(created)))
}

/// `POST /admin/matches/{id}/reset`
pub async fn reset_match<S>(
  State(state): State<AppState<S>>,
  Admin(_): Admin,
  Path(match_id): Path<Uuid>,
) -> Result<Json<Match>, ApiError>
where
  S: BattleStore + Clone + 'static,
{
  Ok(Json(state.engine.reset_match(match_id).await?))
}

/// `DELETE /admin/matches/{id}`
pub async fn delete_match<S>(
  State(state): State<AppState<S>>,
  Admin(_): Admin,
  Path(match_id): Path<Uuid>,
) -> Result<Json<Match>, ApiError>
where
  S: BattleStore + Clone + 'static,
{
  Ok(Json(state.engine.delete_match(match_id).await?))
}

// ─── Brackets ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct BracketReset {
  pub bracket_id: String,
  pub matches:    Vec<Match>,
}

/// `POST /admin/brackets/{id}/reset`
pub async fn reset_bracket<S>(
  State(state): State<AppState<S>>,
  Admin(_): Admin,
  Path(bracket_id): Path<String>,
) -> Result<Json<BracketReset>, ApiError>
where
  S: BattleStore + Clone + 'static,
{
  let matches = state.engine.reset_bracket(&bracket_id).await?;
  Ok(Json(BracketReset { bracket_id, matches }))
}

#[derive(Debug, Serialize)]
pub struct BracketDeleted {
  pub bracket_id:    String,
  pub matches_count: usize,
}

/// `DELETE /admin/brackets/{id}`
pub async fn delete_bracket<S>(
  State(state): State<AppState<S>>,
  Admin(_): Admin,
  Path(bracket_id): Path<String>,
) -> Result<Json<BracketDeleted>, ApiError>
where
  S: BattleStore + Clone + 'static,
{
  let matches_count = state.engine.delete_bracket(&bracket_id).await?;
  Ok(Json(BracketDeleted { bracket_id, matches_count }))
}
