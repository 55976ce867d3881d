//! Synchronous building blocks that run on the database thread.
//!
//! Each function takes a plain [`Connection`] so it can be used both on its
//! own and as one step of a larger transaction. Functions that issue more
//! than one statement must be called inside a transaction by their caller.

use std::num::NonZeroU32;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension as _, params, params_from_iter};
use tracing::debug;
use uuid::Uuid;
use versus_core::{
  Error as CoreError,
  bracket::{self, BracketSummary, FinalPlan, FinalSynthesis},
  candidate::{Candidate, NewCandidate},
  matchup::{Choice, Match, NewMatch},
  store::VoteCommit,
  vote::{Ballot, Vote},
};

use crate::{
  Result,
  encode::{
    MATCH_COLUMNS, RawCandidate, RawMatch, decode_choice, decode_dt, decode_uuid,
    encode_choice, encode_dt, encode_uuid, stored_dt,
  },
};

// ─── Candidates ──────────────────────────────────────────────────────────────

pub fn insert_candidate(
  conn: &Connection,
  input: NewCandidate,
  at: DateTime<Utc>,
) -> Result<Candidate> {
  let inserted = conn.execute(
    "INSERT OR IGNORE INTO candidates (candidate_id, author_id, wins, registered_at)
     VALUES (?1, ?2, 0, ?3)",
    params![input.candidate_id, input.author_id, encode_dt(at)],
  )?;
  if inserted == 0 {
    return Err(CoreError::CandidateExists(input.candidate_id).into());
  }
  Ok(Candidate {
    candidate_id:  input.candidate_id,
    author_id:     input.author_id,
    wins:          0,
    registered_at: stored_dt(at),
  })
}

pub fn select_candidate(conn: &Connection, candidate_id: &str) -> Result<Option<Candidate>> {
  conn
    .query_row(
      "SELECT candidate_id, author_id, wins, registered_at
       FROM candidates WHERE candidate_id = ?1",
      params![candidate_id],
      RawCandidate::from_row,
    )
    .optional()?
    .map(RawCandidate::into_candidate)
    .transpose()
}

pub fn bump_wins(conn: &Connection, candidate_id: &str) -> Result<()> {
  conn.execute(
    "UPDATE candidates SET wins = wins + 1 WHERE candidate_id = ?1",
    params![candidate_id],
  )?;
  Ok(())
}

// ─── Votes ───────────────────────────────────────────────────────────────────

/// Insert a vote; the `(voter_id, match_id)` primary key makes the
/// check-and-insert a single atomic statement.
pub fn insert_vote(
  conn: &Connection,
  voter_id: &str,
  match_id: Uuid,
  choice: Choice,
  at: DateTime<Utc>,
) -> Result<Vote> {
  let inserted = conn.execute(
    "INSERT OR IGNORE INTO votes (voter_id, match_id, choice, recorded_at)
     VALUES (?1, ?2, ?3, ?4)",
    params![voter_id, encode_uuid(match_id), encode_choice(choice), encode_dt(at)],
  )?;
  if inserted == 0 {
    return Err(
      CoreError::DuplicateVote { voter_id: voter_id.to_owned(), match_id }.into(),
    );
  }
  Ok(Vote {
    voter_id: voter_id.to_owned(),
    match_id,
    choice,
    recorded_at: stored_dt(at),
  })
}

pub fn select_choice(conn: &Connection, voter_id: &str, match_id: Uuid) -> Result<Option<Choice>> {
  let raw: Option<String> = conn
    .query_row(
      "SELECT choice FROM votes WHERE voter_id = ?1 AND match_id = ?2",
      params![voter_id, encode_uuid(match_id)],
      |row| row.get(0),
    )
    .optional()?;
  raw.as_deref().map(decode_choice).transpose()
}

pub fn select_voted_matches(conn: &Connection, voter_id: &str) -> Result<Vec<Uuid>> {
  let mut stmt =
    conn.prepare("SELECT DISTINCT match_id FROM votes WHERE voter_id = ?1")?;
  let ids = stmt
    .query_map(params![voter_id], |row| row.get::<_, String>(0))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  ids.iter().map(|s| decode_uuid(s)).collect()
}

pub fn delete_votes(conn: &Connection, match_ids: &[Uuid]) -> Result<usize> {
  if match_ids.is_empty() {
    return Ok(0);
  }
  let sql = format!(
    "DELETE FROM votes WHERE match_id IN ({})",
    placeholders(match_ids.len())
  );
  let ids: Vec<String> = match_ids.iter().copied().map(encode_uuid).collect();
  Ok(conn.execute(&sql, params_from_iter(ids.iter()))?)
}

// ─── Matches: reads ──────────────────────────────────────────────────────────

pub fn select_match(conn: &Connection, match_id: Uuid) -> Result<Option<Match>> {
  conn
    .query_row(
      &format!("SELECT {MATCH_COLUMNS} FROM matches WHERE match_id = ?1"),
      params![encode_uuid(match_id)],
      RawMatch::from_row,
    )
    .optional()?
    .map(RawMatch::into_match)
    .transpose()
}

/// Run a `SELECT {MATCH_COLUMNS} FROM matches ...` query. `clause` is appended
/// after the `FROM` and may reference `args` positionally.
pub fn select_matches(conn: &Connection, clause: &str, args: &[String]) -> Result<Vec<Match>> {
  let mut stmt = conn.prepare(&format!("SELECT {MATCH_COLUMNS} FROM matches {clause}"))?;
  let raws = stmt
    .query_map(params_from_iter(args.iter()), RawMatch::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawMatch::into_match).collect()
}

pub fn select_open(
  conn: &Connection,
  bracket_id: Option<&str>,
  exclude: &[Uuid],
  limit: Option<usize>,
) -> Result<Vec<Match>> {
  let mut clause = String::from("WHERE is_closed = 0");
  let mut args = Vec::new();
  if let Some(b) = bracket_id {
    clause.push_str(" AND bracket_id = ?");
    args.push(b.to_owned());
  }
  if !exclude.is_empty() {
    clause.push_str(&format!(" AND match_id NOT IN ({})", placeholders(exclude.len())));
    args.extend(exclude.iter().copied().map(encode_uuid));
  }
  clause.push_str(" ORDER BY created_at, rowid");
  if let Some(n) = limit {
    clause.push_str(&format!(" LIMIT {n}"));
  }
  select_matches(conn, &clause, &args)
}

pub fn select_closed(conn: &Connection, bracket_id: &str) -> Result<Vec<Match>> {
  select_matches(
    conn,
    "WHERE bracket_id = ? AND is_closed = 1 ORDER BY closed_at, rowid",
    &[bracket_id.to_owned()],
  )
}

pub fn select_semifinals(conn: &Connection, bracket_id: &str) -> Result<Vec<Match>> {
  select_matches(
    conn,
    "WHERE bracket_id = ? AND is_final = 0 ORDER BY created_at, rowid",
    &[bracket_id.to_owned()],
  )
}

pub fn select_final(conn: &Connection, bracket_id: &str) -> Result<Option<Match>> {
  Ok(
    select_matches(
      conn,
      "WHERE bracket_id = ? AND is_final = 1",
      &[bracket_id.to_owned()],
    )?
    .into_iter()
    .next(),
  )
}

pub fn select_bracket(conn: &Connection, bracket_id: &str) -> Result<Vec<Match>> {
  select_matches(
    conn,
    "WHERE bracket_id = ? ORDER BY created_at, rowid",
    &[bracket_id.to_owned()],
  )
}

pub fn select_summaries(conn: &Connection) -> Result<Vec<BracketSummary>> {
  let mut stmt = conn.prepare(
    "SELECT bracket_id,
            COUNT(*),
            SUM(CASE WHEN is_closed = 0 THEN 1 ELSE 0 END),
            SUM(CASE WHEN is_closed = 1 THEN 1 ELSE 0 END),
            MIN(created_at) AS first_created
     FROM matches
     GROUP BY bracket_id
     ORDER BY first_created DESC, bracket_id",
  )?;
  let rows = stmt
    .query_map([], |row| {
      Ok((
        row.get::<_, String>(0)?,
        row.get::<_, u32>(1)?,
        row.get::<_, u32>(2)?,
        row.get::<_, u32>(3)?,
        row.get::<_, String>(4)?,
      ))
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  rows
    .into_iter()
    .map(|(bracket_id, total, active, completed, created_at)| {
      Ok(BracketSummary {
        bracket_id,
        total_matches: total,
        active_matches: active,
        completed_matches: completed,
        created_at: decode_dt(&created_at)?,
      })
    })
    .collect()
}

// ─── Matches: writes ─────────────────────────────────────────────────────────

/// Insert an open, zero-tally match row. With `or_ignore`, a conflict on the
/// single-final index leaves the table untouched and returns `None`.
fn insert_match_row(
  conn: &Connection,
  input: &NewMatch,
  at: DateTime<Utc>,
  or_ignore: bool,
) -> Result<Option<Match>> {
  let match_id = Uuid::new_v4();
  let verb = if or_ignore { "INSERT OR IGNORE" } else { "INSERT" };
  let inserted = conn.execute(
    &format!(
      "{verb} INTO matches (match_id, bracket_id, candidate_a, candidate_b, is_final, created_at)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
    ),
    params![
      encode_uuid(match_id),
      input.bracket_id,
      input.candidate_a,
      input.candidate_b,
      input.is_final,
      encode_dt(at),
    ],
  )?;
  if inserted == 0 {
    return Ok(None);
  }
  select_match(conn, match_id)
}

/// Insert a match after checking the bracket's shape: at most two
/// semifinals, and a single final only once both semifinals exist.
pub fn insert_match(conn: &Connection, input: &NewMatch, at: DateTime<Utc>) -> Result<Match> {
  let existing = select_semifinals(conn, &input.bracket_id)?;
  let semifinals = existing.len();
  if input.is_final {
    if semifinals != 2 {
      return Err(
        CoreError::InvalidInput(format!(
          "bracket {} needs two semifinals before a final, has {semifinals}",
          input.bracket_id
        ))
        .into(),
      );
    }
    if select_final(conn, &input.bracket_id)?.is_some() {
      return Err(CoreError::FinalAlreadyExists(input.bracket_id.clone()).into());
    }
  } else if semifinals >= 2 {
    return Err(CoreError::BracketFull(input.bracket_id.clone()).into());
  } else if let Some(taken) = existing.iter().find_map(|m| {
    [&input.candidate_a, &input.candidate_b]
      .into_iter()
      .find(|c| **c == m.candidate_a || **c == m.candidate_b)
  }) {
    return Err(
      CoreError::InvalidInput(format!(
        "candidate {taken} already plays a semifinal in bracket {}",
        input.bracket_id
      ))
      .into(),
    );
  }

  insert_match_row(conn, input, at, false)?
    .ok_or_else(|| CoreError::FinalAlreadyExists(input.bracket_id.clone()).into())
}

/// Add one vote to a side of an open match.
pub fn bump_tally(conn: &Connection, match_id: Uuid, choice: Choice) -> Result<Match> {
  let current = select_match(conn, match_id)?.ok_or(CoreError::MatchNotFound(match_id))?;
  if current.is_closed {
    return Err(CoreError::MatchClosed(match_id).into());
  }
  let column = match choice {
    Choice::A => "votes_a",
    Choice::B => "votes_b",
  };
  conn.execute(
    &format!(
      "UPDATE matches SET {column} = {column} + 1 WHERE match_id = ?1 AND is_closed = 0"
    ),
    params![encode_uuid(match_id)],
  )?;
  select_match(conn, match_id)?.ok_or_else(|| CoreError::MatchNotFound(match_id).into())
}

/// Close an open match. An already-closed match is returned as stored.
pub fn close_row(
  conn: &Connection,
  match_id: Uuid,
  winner: &str,
  at: DateTime<Utc>,
) -> Result<Match> {
  let current = select_match(conn, match_id)?.ok_or(CoreError::MatchNotFound(match_id))?;
  if current.is_closed {
    return Ok(current);
  }
  if winner != current.candidate_a && winner != current.candidate_b {
    return Err(
      CoreError::InvalidInput(format!(
        "{winner} is not a candidate in match {match_id}"
      ))
      .into(),
    );
  }
  conn.execute(
    "UPDATE matches SET is_closed = 1, winner = ?2, closed_at = ?3
     WHERE match_id = ?1 AND is_closed = 0",
    params![encode_uuid(match_id), winner, encode_dt(at)],
  )?;
  select_match(conn, match_id)?.ok_or_else(|| CoreError::MatchNotFound(match_id).into())
}

/// Reopen matches with zero tallies and delete their votes.
pub fn reset_rows(conn: &Connection, matches: &[Match]) -> Result<Vec<Match>> {
  let ids: Vec<Uuid> = matches.iter().map(|m| m.match_id).collect();
  for id in &ids {
    conn.execute(
      "UPDATE matches
       SET votes_a = 0, votes_b = 0, is_closed = 0, winner = NULL, closed_at = NULL
       WHERE match_id = ?1",
      params![encode_uuid(*id)],
    )?;
  }
  delete_votes(conn, &ids)?;

  let mut reset = Vec::with_capacity(ids.len());
  for id in ids {
    reset.extend(select_match(conn, id)?);
  }
  Ok(reset)
}

/// Delete matches along with their votes.
pub fn delete_rows(conn: &Connection, matches: &[Match]) -> Result<()> {
  let ids: Vec<Uuid> = matches.iter().map(|m| m.match_id).collect();
  delete_votes(conn, &ids)?;
  for id in ids {
    conn.execute("DELETE FROM matches WHERE match_id = ?1", params![encode_uuid(id)])?;
  }
  Ok(())
}

// ─── Compound operations ─────────────────────────────────────────────────────

/// Create the final if both semifinals are closed and none exists.
pub fn synthesize(conn: &Connection, bracket_id: &str, at: DateTime<Utc>) -> Result<FinalSynthesis> {
  let semifinals = select_semifinals(conn, bracket_id)?;
  let existing = select_final(conn, bracket_id)?;

  let (candidate_a, candidate_b) = match bracket::plan_final(&semifinals, existing) {
    FinalPlan::NotReady => return Ok(FinalSynthesis::NotReady),
    FinalPlan::Existing(m) => return Ok(FinalSynthesis::Existing(m)),
    FinalPlan::Create { candidate_a, candidate_b } => (candidate_a, candidate_b),
  };

  let input = NewMatch::final_between(bracket_id, candidate_a, candidate_b);
  match insert_match_row(conn, &input, at, true)? {
    Some(created) => Ok(FinalSynthesis::Created(created)),
    None => {
      debug!(%bracket_id, "final already present at insert time");
      select_final(conn, bracket_id)?
        .map(FinalSynthesis::Existing)
        .ok_or_else(|| CoreError::FinalAlreadyExists(bracket_id.to_owned()).into())
    }
  }
}

/// Everything one vote does, in order. Must run inside a transaction.
pub fn commit_vote(
  conn: &Connection,
  ballot: &Ballot,
  threshold: NonZeroU32,
  at: DateTime<Utc>,
) -> Result<VoteCommit> {
  let current = select_match(conn, ballot.match_id)?
    .ok_or(CoreError::MatchNotFound(ballot.match_id))?;
  if current.is_closed {
    return Err(CoreError::MatchClosed(ballot.match_id).into());
  }

  insert_vote(conn, &ballot.voter_id, ballot.match_id, ballot.choice, at)?;
  let mut updated = bump_tally(conn, ballot.match_id, ballot.choice)?;

  let Some(side) = bracket::evaluate_closure(&updated, threshold) else {
    return Ok(VoteCommit { updated, closed: false, final_synthesis: None });
  };

  let winner = updated.candidate(side).to_owned();
  updated = close_row(conn, ballot.match_id, &winner, at)?;
  bump_wins(conn, &winner)?;

  let final_synthesis = if updated.is_semifinal() {
    Some(synthesize(conn, &updated.bracket_id, at)?)
  } else {
    None
  };

  Ok(VoteCommit { updated, closed: true, final_synthesis })
}

fn placeholders(n: usize) -> String { vec!["?"; n].join(", ") }
