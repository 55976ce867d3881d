//! Bracket rules: winner selection, closure, final synthesis and the derived
//! bracket stage.
//!
//! Everything here is pure. Storage backends call these functions from inside
//! their transactions so the decision and the write happen as one unit, and
//! the engine calls them when it needs to reason about a bracket.

use std::{collections::HashSet, num::NonZeroU32};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  matchup::{Choice, Match},
};

/// Number of candidates a bracket is seeded from.
pub const SEED_SIZE: usize = 4;

// ─── Identity ────────────────────────────────────────────────────────────────

/// Generate a fresh, opaque bracket identifier.
pub fn new_bracket_id() -> String {
  format!("bracket_{}", Uuid::new_v4().simple())
}

/// Validate a seeding request and split it into the two semifinal pairings:
/// `c[0] vs c[1]` and `c[2] vs c[3]`.
pub fn seed_pairs(candidate_ids: &[String]) -> Result<[(String, String); 2]> {
  let [a, b, c, d] = candidate_ids else {
    return Err(Error::InvalidCandidateCount(candidate_ids.len()));
  };
  ensure_distinct(candidate_ids)?;
  Ok([(a.clone(), b.clone()), (c.clone(), d.clone())])
}

/// Reject empty or repeated candidate ids.
pub fn ensure_distinct(candidate_ids: &[String]) -> Result<()> {
  let mut seen = HashSet::new();
  for id in candidate_ids {
    if id.trim().is_empty() {
      return Err(Error::InvalidInput("candidate id must not be empty".into()));
    }
    if !seen.insert(id.as_str()) {
      return Err(Error::InvalidInput(format!(
        "candidate {id} appears more than once"
      )));
    }
  }
  Ok(())
}

// ─── Closure ─────────────────────────────────────────────────────────────────

/// A wins only on a strict majority; an exact tie goes to B.
pub fn select_winner(votes_a: u32, votes_b: u32) -> Choice {
  if votes_a > votes_b { Choice::A } else { Choice::B }
}

/// Decide whether an open match must close now, and for whom.
pub fn evaluate_closure(m: &Match, threshold: NonZeroU32) -> Option<Choice> {
  if m.is_closed || m.total_votes() < threshold.get() {
    return None;
  }
  Some(select_winner(m.votes_a, m.votes_b))
}

/// The winning candidate id of a closed match.
pub fn winner_of(m: &Match) -> Option<&str> {
  if !m.is_closed {
    return None;
  }
  Some(
    m.winner
      .as_deref()
      .unwrap_or_else(|| m.candidate(select_winner(m.votes_a, m.votes_b))),
  )
}

// ─── Final synthesis ─────────────────────────────────────────────────────────

/// What final synthesis should do for a bracket, given its current matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalPlan {
  NotReady,
  /// A final already exists; synthesis must leave it untouched.
  Existing(Match),
  /// Both semifinals are closed and no final exists yet.
  Create { candidate_a: String, candidate_b: String },
}

pub fn plan_final(semifinals: &[Match], existing_final: Option<Match>) -> FinalPlan {
  let [first, second] = semifinals else {
    return FinalPlan::NotReady;
  };
  let (Some(a), Some(b)) = (winner_of(first), winner_of(second)) else {
    return FinalPlan::NotReady;
  };
  match existing_final {
    Some(f) => FinalPlan::Existing(f),
    None => FinalPlan::Create { candidate_a: a.to_owned(), candidate_b: b.to_owned() },
  }
}

/// Outcome of [`crate::engine::BracketEngine::synthesize_final_if_ready`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "match", rename_all = "snake_case")]
pub enum FinalSynthesis {
  NotReady,
  Existing(Match),
  Created(Match),
}

impl FinalSynthesis {
  pub fn final_match(&self) -> Option<&Match> {
    match self {
      Self::NotReady => None,
      Self::Existing(m) | Self::Created(m) => Some(m),
    }
  }

  pub fn created(&self) -> Option<&Match> {
    match self {
      Self::Created(m) => Some(m),
      _ => None,
    }
  }
}

// ─── Derived stage ───────────────────────────────────────────────────────────

/// Where a bracket stands. Never stored; always derived from its matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketStage {
  /// Fewer than two semifinals (only reachable through admin creation).
  Forming,
  SemifinalsOpen,
  OneSemifinalClosed,
  /// Both semifinals closed but no final yet.
  FinalPending,
  FinalOpen,
  Complete,
}

impl BracketStage {
  pub fn derive(semifinals: &[Match], final_match: Option<&Match>) -> Self {
    if let Some(f) = final_match {
      return if f.is_closed { Self::Complete } else { Self::FinalOpen };
    }
    if semifinals.len() < 2 {
      return Self::Forming;
    }
    match semifinals.iter().filter(|m| m.is_closed).count() {
      0 => Self::SemifinalsOpen,
      1 => Self::OneSemifinalClosed,
      _ => Self::FinalPending,
    }
  }
}

/// The computed read model for a bracket.
#[derive(Debug, Clone, Serialize)]
pub struct BracketView {
  pub bracket_id:  String,
  pub stage:       BracketStage,
  pub semifinals:  Vec<Match>,
  #[serde(rename = "final")]
  pub final_match: Option<Match>,
}

/// Per-bracket aggregate counts for the administrative listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketSummary {
  pub bracket_id:        String,
  pub total_matches:     u32,
  pub active_matches:    u32,
  pub completed_matches: u32,
  /// Creation time of the bracket's earliest match.
  pub created_at:        DateTime<Utc>,
}

/// Returned by seeding: the new bracket id and its two semifinals.
#[derive(Debug, Clone, Serialize)]
pub struct SeededBracket {
  pub bracket_id: String,
  pub matches:    [Match; 2],
}
