//! Candidate, the boundary record for a content item taking part in battles.
//!
//! Content itself lives elsewhere. The directory only knows enough to check a
//! candidate exists, route notifications to its author and count its wins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
  pub candidate_id:  String,
  pub author_id:     String,
  /// Lifetime count of matches this candidate has won.
  pub wins:          u32,
  pub registered_at: DateTime<Utc>,
}

/// Input to [`crate::store::BattleStore::register_candidate`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewCandidate {
  pub candidate_id: String,
  pub author_id:    String,
}
