//! Handlers for `/candidates` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/candidates/{id}` | Directory entry with lifetime wins; 404 if unknown |

use axum::{Json, extract::State};
use versus_core::{candidate::Candidate, store::BattleStore};

use crate::{AppState, error::ApiError, extract::Path};

/// `GET /candidates/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(candidate_id): Path<String>,
) -> Result<Json<Candidate>, ApiError>
where
  S: BattleStore + Clone + 'static,
{
  Ok(Json(state.engine.candidate(&candidate_id).await?))
}
