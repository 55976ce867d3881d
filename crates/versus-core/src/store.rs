//! The `BattleStore` trait and its compound-operation result types.
//!
//! The trait is implemented by storage backends (e.g. `versus-store-sqlite`).
//! It bundles three collaborators behind one handle: the candidate directory,
//! the vote ledger and the match store. The compound operations at the end
//! are the ones the engine relies on for atomicity; each must behave as a
//! single all-or-nothing unit even under concurrent callers.

use std::{future::Future, num::NonZeroU32};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  bracket::{BracketSummary, FinalSynthesis},
  candidate::{Candidate, NewCandidate},
  matchup::{Choice, Match, NewMatch},
  vote::{Ballot, Vote},
};

// ─── Compound results ────────────────────────────────────────────────────────

/// Everything a single committed vote changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteCommit {
  /// The match after the tally increment and any closure.
  pub updated:         Match,
  /// `true` only for the one vote that performed the closure transition.
  pub closed:          bool,
  /// Present when the vote closed a semifinal.
  pub final_synthesis: Option<FinalSynthesis>,
}

/// Lift a backend error into [`crate::Error`].
pub fn lift<E: Into<crate::Error>>(err: E) -> crate::Error { err.into() }

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Versus storage backend.
///
/// Domain failures (`DuplicateVote`, `MatchClosed`, …) surface through
/// `Self::Error` and convert losslessly into [`crate::Error`]; anything else
/// converts into [`crate::Error::Storage`].
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait BattleStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + Into<crate::Error> + 'static;

  // ── Candidate directory ───────────────────────────────────────────────

  /// Register a content item so it can be seeded into brackets.
  fn register_candidate(
    &self,
    input: NewCandidate,
  ) -> impl Future<Output = Result<Candidate, Self::Error>> + Send + '_;

  fn get_candidate(
    &self,
    candidate_id: String,
  ) -> impl Future<Output = Result<Option<Candidate>, Self::Error>> + Send + '_;

  /// Bump a candidate's lifetime win counter. Unknown ids are ignored.
  fn increment_win_count(
    &self,
    candidate_id: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Vote ledger ───────────────────────────────────────────────────────

  /// Insert a vote. Concurrent calls for the same `(voter, match)` yield
  /// exactly one success; the rest fail with `DuplicateVote`.
  fn record_vote(
    &self,
    voter_id: String,
    match_id: Uuid,
    choice: Choice,
  ) -> impl Future<Output = Result<Vote, Self::Error>> + Send + '_;

  fn has_voted(
    &self,
    voter_id: String,
    match_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn choice_of(
    &self,
    voter_id: String,
    match_id: Uuid,
  ) -> impl Future<Output = Result<Option<Choice>, Self::Error>> + Send + '_;

  fn distinct_matches_voted_on(
    &self,
    voter_id: String,
  ) -> impl Future<Output = Result<Vec<Uuid>, Self::Error>> + Send + '_;

  /// Administrative path only. Returns the number of votes removed.
  fn delete_votes_for_match(
    &self,
    match_id: Uuid,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Administrative path only. Returns the number of votes removed.
  fn delete_votes_for_matches(
    &self,
    match_ids: Vec<Uuid>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  // ── Match store ───────────────────────────────────────────────────────

  /// Persist a new open match with zero tallies.
  ///
  /// Fails with `BracketFull` for a third semifinal, `InvalidInput` for a
  /// final in a bracket without two semifinals, and `FinalAlreadyExists` for
  /// a second final.
  fn create_match(
    &self,
    input: NewMatch,
    created_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Match, Self::Error>> + Send + '_;

  /// Create a bracket's two semifinals together, or neither.
  fn create_semifinals(
    &self,
    bracket_id: String,
    pairs: [(String, String); 2],
    created_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<[Match; 2], Self::Error>> + Send + '_;

  fn get_match(
    &self,
    match_id: Uuid,
  ) -> impl Future<Output = Result<Option<Match>, Self::Error>> + Send + '_;

  /// Add one vote to `choice`'s tally. Fails with `MatchNotFound` or
  /// `MatchClosed`.
  fn increment_tally(
    &self,
    match_id: Uuid,
    choice: Choice,
  ) -> impl Future<Output = Result<Match, Self::Error>> + Send + '_;

  /// Close a match. On an already-closed match this is a no-op returning the
  /// existing record; it never re-picks a winner.
  fn close_match(
    &self,
    match_id: Uuid,
    winner: String,
    closed_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Match, Self::Error>> + Send + '_;

  /// Open matches in creation order, optionally restricted to a bracket.
  fn find_open(
    &self,
    bracket_id: Option<String>,
  ) -> impl Future<Output = Result<Vec<Match>, Self::Error>> + Send + '_;

  /// Earliest-created open match not in `exclude`.
  fn first_open(
    &self,
    bracket_id: Option<String>,
    exclude: Vec<Uuid>,
  ) -> impl Future<Output = Result<Option<Match>, Self::Error>> + Send + '_;

  /// Closed matches of a bracket, ordered by closure time ascending.
  fn find_closed(
    &self,
    bracket_id: String,
  ) -> impl Future<Output = Result<Vec<Match>, Self::Error>> + Send + '_;

  fn find_final(
    &self,
    bracket_id: String,
  ) -> impl Future<Output = Result<Option<Match>, Self::Error>> + Send + '_;

  /// The bracket's non-final matches in creation order (0, 1 or 2).
  fn find_semifinals(
    &self,
    bracket_id: String,
  ) -> impl Future<Output = Result<Vec<Match>, Self::Error>> + Send + '_;

  /// Delete a match and its votes. Returns the deleted match, if any.
  fn delete_match(
    &self,
    match_id: Uuid,
  ) -> impl Future<Output = Result<Option<Match>, Self::Error>> + Send + '_;

  /// Delete every match of a bracket and their votes.
  fn delete_all_for_bracket(
    &self,
    bracket_id: String,
  ) -> impl Future<Output = Result<Vec<Match>, Self::Error>> + Send + '_;

  /// Aggregate counts per bracket, newest bracket first.
  fn list_brackets(
    &self,
  ) -> impl Future<Output = Result<Vec<BracketSummary>, Self::Error>> + Send + '_;

  // ── Compound operations ───────────────────────────────────────────────

  /// Record a ballot and apply its consequences as one atomic unit: ledger
  /// insert, tally increment, closure at `threshold` (winner chosen by
  /// [`crate::bracket::select_winner`], win counter bumped) and, when a
  /// semifinal closes, final synthesis.
  fn commit_vote(
    &self,
    ballot: Ballot,
    threshold: NonZeroU32,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<VoteCommit, Self::Error>> + Send + '_;

  /// Create the bracket's final if both semifinals are closed and none
  /// exists. Idempotent and safe under concurrent callers.
  fn synthesize_final(
    &self,
    bracket_id: String,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<FinalSynthesis, Self::Error>> + Send + '_;

  /// Reopen a match with zero tallies and delete its votes, atomically.
  fn reset_match(
    &self,
    match_id: Uuid,
  ) -> impl Future<Output = Result<Option<Match>, Self::Error>> + Send + '_;

  /// Reset every match of a bracket and delete their votes, atomically.
  fn reset_bracket(
    &self,
    bracket_id: String,
  ) -> impl Future<Output = Result<Vec<Match>, Self::Error>> + Send + '_;
}
