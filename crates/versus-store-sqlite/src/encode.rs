//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with a fixed microsecond width
//! and a `Z` suffix so that lexical order equals chronological order. UUIDs
//! are stored as hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, SubsecRound as _, Utc};
use versus_core::{candidate::Candidate, matchup::{Choice, Match}};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

/// The value a timestamp will have after a round trip through the database.
pub fn stored_dt(dt: DateTime<Utc>) -> DateTime<Utc> { dt.trunc_subsecs(6) }

// ─── Choice ───────────────────────────────────────────────────────────────────

pub fn encode_choice(c: Choice) -> &'static str { c.as_str() }

pub fn decode_choice(s: &str) -> Result<Choice> {
  match s {
    "A" => Ok(Choice::A),
    "B" => Ok(Choice::B),
    other => Err(Error::Decode(format!("unknown choice: {other:?}"))),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawMatch::from_row`].
pub const MATCH_COLUMNS: &str = "match_id, bracket_id, candidate_a, candidate_b, \
   votes_a, votes_b, is_final, is_closed, winner, created_at, closed_at";

/// Raw values read directly from a `matches` row.
pub struct RawMatch {
  pub match_id:    String,
  pub bracket_id:  String,
  pub candidate_a: String,
  pub candidate_b: String,
  pub votes_a:     u32,
  pub votes_b:     u32,
  pub is_final:    bool,
  pub is_closed:   bool,
  pub winner:      Option<String>,
  pub created_at:  String,
  pub closed_at:   Option<String>,
}

impl RawMatch {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      match_id:    row.get(0)?,
      bracket_id:  row.get(1)?,
      candidate_a: row.get(2)?,
      candidate_b: row.get(3)?,
      votes_a:     row.get(4)?,
      votes_b:     row.get(5)?,
      is_final:    row.get(6)?,
      is_closed:   row.get(7)?,
      winner:      row.get(8)?,
      created_at:  row.get(9)?,
      closed_at:   row.get(10)?,
    })
  }

  pub fn into_match(self) -> Result<Match> {
    Ok(Match {
      match_id:    decode_uuid(&self.match_id)?,
      bracket_id:  self.bracket_id,
      candidate_a: self.candidate_a,
      candidate_b: self.candidate_b,
      votes_a:     self.votes_a,
      votes_b:     self.votes_b,
      is_final:    self.is_final,
      is_closed:   self.is_closed,
      winner:      self.winner,
      created_at:  decode_dt(&self.created_at)?,
      closed_at:   self.closed_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// Raw values read directly from a `candidates` row.
pub struct RawCandidate {
  pub candidate_id:  String,
  pub author_id:     String,
  pub wins:          u32,
  pub registered_at: String,
}

impl RawCandidate {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      candidate_id:  row.get(0)?,
      author_id:     row.get(1)?,
      wins:          row.get(2)?,
      registered_at: row.get(3)?,
    })
  }

  pub fn into_candidate(self) -> Result<Candidate> {
    Ok(Candidate {
      candidate_id:  self.candidate_id,
      author_id:     self.author_id,
      wins:          self.wins,
      registered_at: decode_dt(&self.registered_at)?,
    })
  }
}
