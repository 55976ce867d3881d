//! Handlers for `/matches` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/matches/next` | Optional auth, `?bracket_id=`; 404 when nothing is left |
//! | `GET`  | `/matches/{id}` | 404 if not found |
//! | `POST` | `/matches/{id}/vote` | Voter. Body: `{"vote":"A"}` |
//! | `GET`  | `/matches/{id}/my-vote` | Voter |

use axum::{
  Json,
  extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use versus_core::{
  engine::VoteReceipt,
  matchup::{Choice, Match},
  store::BattleStore,
  vote::Ballot,
};

use crate::{
  AppState,
  auth::{MaybeVoter, Voter},
  error::ApiError,
  extract::{JsonBody, Path},
};

// ─── Next ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct NextParams {
  pub bracket_id: Option<String>,
}

/// `GET /matches/next[?bracket_id=<id>]`
pub async fn next<S>(
  State(state): State<AppState<S>>,
  MaybeVoter(voter): MaybeVoter,
  Query(params): Query<NextParams>,
) -> Result<Json<Match>, ApiError>
where
  S: BattleStore + Clone + 'static,
{
  let voter_id = voter.as_ref().map(|v| v.username.as_str());
  state
    .engine
    .selector()
    .next_match(params.bracket_id.as_deref(), voter_id)
    .await?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound("no open match available".into()))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /matches/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(match_id): Path<Uuid>,
) -> Result<Json<Match>, ApiError>
where
  S: BattleStore + Clone + 'static,
{
  Ok(Json(state.engine.get_match(match_id).await?))
}

// ─── Vote ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct VoteBody {
  /// `"A"` or `"B"`; parsed by hand so a bad value gets a domain error.
  pub vote: String,
}

/// `POST /matches/{id}/vote` with body `{"vote":"A"}`
pub async fn vote<S>(
  State(state): State<AppState<S>>,
  Voter(voter): Voter,
  Path(match_id): Path<Uuid>,
  JsonBody(body): JsonBody<VoteBody>,
) -> Result<Json<VoteReceipt>, ApiError>
where
  S: BattleStore + Clone + 'static,
{
  let choice: Choice = body.vote.parse()?;
  let receipt = state
    .engine
    .cast_vote(Ballot { match_id, voter_id: voter.username, choice })
    .await?;
  Ok(Json(receipt))
}

// ─── My vote ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct MyVote {
  pub has_voted: bool,
  pub vote:      Option<Choice>,
}

/// `GET /matches/{id}/my-vote`
pub async fn my_vote<S>(
  State(state): State<AppState<S>>,
  Voter(voter): Voter,
  Path(match_id): Path<Uuid>,
) -> Result<Json<MyVote>, ApiError>
where
  S: BattleStore + Clone + 'static,
{
  let choice = state
    .engine
    .selector()
    .choice_of(&voter.username, match_id)
    .await?;
  Ok(Json(MyVote { has_voted: choice.is_some(), vote: choice }))
}
