//! Vote: one voter's immutable decision on one match.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::matchup::Choice;

/// At most one vote exists per `(voter_id, match_id)`. A vote is never
/// updated; it disappears only when its match is reset or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
  pub voter_id:    String,
  pub match_id:    Uuid,
  pub choice:      Choice,
  pub recorded_at: DateTime<Utc>,
}

/// A vote request as it enters the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ballot {
  pub match_id: Uuid,
  pub voter_id: String,
  pub choice:   Choice,
}
