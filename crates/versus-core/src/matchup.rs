//! Match types for a single two-candidate voting contest.
//!
//! A match moves `Open → Closed` exactly once. While open its tallies only
//! grow; once closed they are frozen and the winner is fixed. Only an
//! administrative reset returns a match to the open state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Choice ──────────────────────────────────────────────────────────────────

/// Which side of a match a vote is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Choice {
  A,
  B,
}

impl Choice {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::A => "A",
      Self::B => "B",
    }
  }
}

impl std::str::FromStr for Choice {
  type Err = crate::Error;

  fn from_str(s: &str) -> crate::Result<Self> {
    match s {
      "A" => Ok(Self::A),
      "B" => Ok(Self::B),
      other => Err(crate::Error::InvalidInput(format!(
        "vote must be either \"A\" or \"B\", got {other:?}"
      ))),
    }
  }
}

// ─── Match ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
  pub match_id:    Uuid,
  pub bracket_id:  String,
  pub candidate_a: String,
  pub candidate_b: String,
  pub votes_a:     u32,
  pub votes_b:     u32,
  pub is_final:    bool,
  pub is_closed:   bool,
  /// Set in the same transition that sets `is_closed`.
  pub winner:      Option<String>,
  pub created_at:  DateTime<Utc>,
  pub closed_at:   Option<DateTime<Utc>>,
}

impl Match {
  pub fn total_votes(&self) -> u32 { self.votes_a + self.votes_b }

  pub fn percentage_a(&self) -> u8 { percentage(self.votes_a, self.total_votes()) }

  pub fn percentage_b(&self) -> u8 { percentage(self.votes_b, self.total_votes()) }

  pub fn is_semifinal(&self) -> bool { !self.is_final }

  pub fn candidate(&self, choice: Choice) -> &str {
    match choice {
      Choice::A => &self.candidate_a,
      Choice::B => &self.candidate_b,
    }
  }
}

fn percentage(part: u32, total: u32) -> u8 {
  if total == 0 {
    return 0;
  }
  (f64::from(part) / f64::from(total) * 100.0).round() as u8
}

// ─── NewMatch ────────────────────────────────────────────────────────────────

/// Input to [`crate::store::BattleStore::create_match`]. Identity, tallies and
/// timestamps are always assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMatch {
  pub bracket_id:  String,
  pub candidate_a: String,
  pub candidate_b: String,
  pub is_final:    bool,
}

impl NewMatch {
  pub fn semifinal(
    bracket_id: impl Into<String>,
    candidate_a: impl Into<String>,
    candidate_b: impl Into<String>,
  ) -> Self {
    Self {
      bracket_id:  bracket_id.into(),
      candidate_a: candidate_a.into(),
      candidate_b: candidate_b.into(),
      is_final:    false,
    }
  }

  pub fn final_between(
    bracket_id: impl Into<String>,
    candidate_a: impl Into<String>,
    candidate_b: impl Into<String>,
  ) -> Self {
    Self { is_final: true, ..Self::semifinal(bracket_id, candidate_a, candidate_b) }
  }
}
