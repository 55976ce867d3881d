//! Error types for `versus-core`.

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// The classification a caller must be able to distinguish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
  /// Rejected before any state mutation.
  InvalidInput,
  NotFound,
  /// Expected, recoverable condition; never retried automatically.
  Conflict,
  /// The backing store could not complete the request. Nothing was applied.
  Unavailable,
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("a bracket is seeded from exactly 4 candidates, got {0}")]
  InvalidCandidateCount(usize),

  #[error("invalid input: {0}")]
  InvalidInput(String),

  #[error("match not found: {0}")]
  MatchNotFound(Uuid),

  #[error("bracket not found: {0}")]
  BracketNotFound(String),

  #[error("candidate not found: {0}")]
  CandidateNotFound(String),

  #[error("voter {voter_id} has already voted on match {match_id}")]
  DuplicateVote { voter_id: String, match_id: Uuid },

  #[error("match {0} is already closed")]
  MatchClosed(Uuid),

  #[error("bracket {0} already has a final match")]
  FinalAlreadyExists(String),

  #[error("bracket {0} already has two semifinal matches")]
  BracketFull(String),

  #[error("candidate {0} is already registered")]
  CandidateExists(String),

  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::InvalidCandidateCount(_) | Self::InvalidInput(_) => {
        ErrorKind::InvalidInput
      }
      Self::MatchNotFound(_)
      | Self::BracketNotFound(_)
      | Self::CandidateNotFound(_) => ErrorKind::NotFound,
      Self::DuplicateVote { .. }
      | Self::MatchClosed(_)
      | Self::FinalAlreadyExists(_)
      | Self::BracketFull(_)
      | Self::CandidateExists(_) => ErrorKind::Conflict,
      Self::Storage(_) => ErrorKind::Unavailable,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
