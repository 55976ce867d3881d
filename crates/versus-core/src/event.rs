//! Match-state-change events and the narrow publishing interface the engine
//! depends on.
//!
//! Delivery is best-effort: publishing never fails, never blocks and is never
//! rolled back against the state change that triggered it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::matchup::Match;

/// The audience an event is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", content = "id", rename_all = "snake_case")]
pub enum Scope {
  /// Every subscriber.
  Global,
  /// Subscribers watching one bracket.
  Bracket(String),
  /// Subscribers following one content author.
  Author(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
  #[serde(rename = "match.created")]
  MatchCreated {
    bracket_id: String,
    match_ids:  Vec<Uuid>,
  },
  #[serde(rename = "bracket.created")]
  BracketCreated { bracket_id: String },
  #[serde(rename = "match.updated")]
  MatchUpdated {
    match_id:     Uuid,
    bracket_id:   String,
    votes_a:      u32,
    votes_b:      u32,
    percentage_a: u8,
    percentage_b: u8,
    is_closed:    bool,
  },
  #[serde(rename = "match.closed")]
  MatchClosed {
    match_id:   Uuid,
    bracket_id: String,
    winner:     Option<String>,
    is_final:   bool,
  },
  #[serde(rename = "final.created")]
  FinalCreated {
    bracket_id:     String,
    final_match_id: Uuid,
    candidate_a:    String,
    candidate_b:    String,
  },
  #[serde(rename = "match.reset")]
  MatchReset {
    match_id:   Uuid,
    bracket_id: String,
    votes_a:    u32,
    votes_b:    u32,
  },
  #[serde(rename = "match.deleted")]
  MatchDeleted {
    match_id:   Uuid,
    bracket_id: String,
  },
  #[serde(rename = "bracket.deleted")]
  BracketDeleted {
    bracket_id:    String,
    matches_count: usize,
  },
}

impl Event {
  pub fn updated(m: &Match) -> Self {
    Self::MatchUpdated {
      match_id:     m.match_id,
      bracket_id:   m.bracket_id.clone(),
      votes_a:      m.votes_a,
      votes_b:      m.votes_b,
      percentage_a: m.percentage_a(),
      percentage_b: m.percentage_b(),
      is_closed:    m.is_closed,
    }
  }

  pub fn closed(m: &Match) -> Self {
    Self::MatchClosed {
      match_id:   m.match_id,
      bracket_id: m.bracket_id.clone(),
      winner:     m.winner.clone(),
      is_final:   m.is_final,
    }
  }

  pub fn final_created(m: &Match) -> Self {
    Self::FinalCreated {
      bracket_id:     m.bracket_id.clone(),
      final_match_id: m.match_id,
      candidate_a:    m.candidate_a.clone(),
      candidate_b:    m.candidate_b.clone(),
    }
  }

  pub fn reset(m: &Match) -> Self {
    Self::MatchReset {
      match_id:   m.match_id,
      bracket_id: m.bracket_id.clone(),
      votes_a:    m.votes_a,
      votes_b:    m.votes_b,
    }
  }

  /// The wire name, e.g. `"match.closed"`.
  pub fn name(&self) -> &'static str {
    match self {
      Self::MatchCreated { .. } => "match.created",
      Self::BracketCreated { .. } => "bracket.created",
      Self::MatchUpdated { .. } => "match.updated",
      Self::MatchClosed { .. } => "match.closed",
      Self::FinalCreated { .. } => "final.created",
      Self::MatchReset { .. } => "match.reset",
      Self::MatchDeleted { .. } => "match.deleted",
      Self::BracketDeleted { .. } => "bracket.deleted",
    }
  }
}

/// Fire-and-forget event sink.
///
/// Implementations must not block and must swallow their own delivery
/// failures.
pub trait Publisher: Send + Sync {
  fn publish(&self, event: &Event, scope: Scope);
}

/// Publisher that drops everything.
impl Publisher for () {
  fn publish(&self, _event: &Event, _scope: Scope) {}
}

impl<P: Publisher + ?Sized> Publisher for std::sync::Arc<P> {
  fn publish(&self, event: &Event, scope: Scope) { (**self).publish(event, scope) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn events_serialize_with_dotted_type() {
    let event = Event::BracketCreated { bracket_id: "bracket_1".into() };
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(
      json,
      serde_json::json!({ "type": "bracket.created", "data": { "bracket_id": "bracket_1" } })
    );
    assert_eq!(event.name(), "bracket.created");
  }
}
