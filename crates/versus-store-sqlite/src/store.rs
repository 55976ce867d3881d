//! [`SqliteStore`], the SQLite implementation of [`BattleStore`].

use std::{num::NonZeroU32, path::Path};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, TransactionBehavior};
use uuid::Uuid;

use versus_core::{
  bracket::{BracketSummary, FinalSynthesis},
  candidate::{Candidate, NewCandidate},
  matchup::{Choice, Match, NewMatch},
  store::{BattleStore, VoteCommit},
  vote::{Ballot, Vote},
};

use crate::{Error, Result, ops, schema::SCHEMA};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Versus store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All clones
/// share one database thread, so statements from concurrent requests are
/// serialized and each transaction sees a consistent snapshot.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `f` on the database thread.
  async fn read<T, F>(&self, f: F) -> Result<T>
  where
    F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    self.conn.call(move |conn| Ok(f(conn))).await?
  }

  /// Run `f` inside an immediate transaction on the database thread. The
  /// transaction commits only if `f` succeeds; any error rolls back every
  /// statement `f` issued.
  async fn write<T, F>(&self, f: F) -> Result<T>
  where
    F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let outcome = f(&tx);
        if outcome.is_ok() {
          tx.commit()?;
        }
        Ok(outcome)
      })
      .await?
  }
}

// ─── BattleStore impl ────────────────────────────────────────────────────────

impl BattleStore for SqliteStore {
  type Error = Error;

  // ── Candidate directory ───────────────────────────────────────────────────

  async fn register_candidate(&self, input: NewCandidate) -> Result<Candidate> {
    self
      .write(move |conn| ops::insert_candidate(conn, input, Utc::now()))
      .await
  }

  async fn get_candidate(&self, candidate_id: String) -> Result<Option<Candidate>> {
    self
      .read(move |conn| ops::select_candidate(conn, &candidate_id))
      .await
  }

  async fn increment_win_count(&self, candidate_id: String) -> Result<()> {
    self
      .write(move |conn| ops::bump_wins(conn, &candidate_id))
      .await
  }

  // ── Vote ledger ───────────────────────────────────────────────────────────

  async fn record_vote(
    &self,
    voter_id: String,
    match_id: Uuid,
    choice: Choice,
  ) -> Result<Vote> {
    self
      .write(move |conn| {
        ops::select_match(conn, match_id)?
          .ok_or(versus_core::Error::MatchNotFound(match_id))?;
        ops::insert_vote(conn, &voter_id, match_id, choice, Utc::now())
      })
      .await
  }

  async fn has_voted(&self, voter_id: String, match_id: Uuid) -> Result<bool> {
    Ok(self.choice_of(voter_id, match_id).await?.is_some())
  }

  async fn choice_of(&self, voter_id: String, match_id: Uuid) -> Result<Option<Choice>> {
    self
      .read(move |conn| ops::select_choice(conn, &voter_id, match_id))
      .await
  }

  async fn distinct_matches_voted_on(&self, voter_id: String) -> Result<Vec<Uuid>> {
    self
      .read(move |conn| ops::select_voted_matches(conn, &voter_id))
      .await
  }

  async fn delete_votes_for_match(&self, match_id: Uuid) -> Result<usize> {
    self
      .write(move |conn| ops::delete_votes(conn, &[match_id]))
      .await
  }

  async fn delete_votes_for_matches(&self, match_ids: Vec<Uuid>) -> Result<usize> {
    self
      .write(move |conn| ops::delete_votes(conn, &match_ids))
      .await
  }

  // ── Match store ───────────────────────────────────────────────────────────

  async fn create_match(&self, input: NewMatch, created_at: DateTime<Utc>) -> Result<Match> {
    self
      .write(move |conn| ops::insert_match(conn, &input, created_at))
      .await
  }

  async fn create_semifinals(
    &self,
    bracket_id: String,
    pairs:      [(String, String); 2],
    created_at: DateTime<Utc>,
  ) -> Result<[Match; 2]> {
    self
      .write(move |conn| {
        let [(a1, b1), (a2, b2)] = pairs;
        let first = ops::insert_match(conn, &NewMatch::semifinal(&bracket_id, a1, b1), created_at)?;
        let second = ops::insert_match(conn, &NewMatch::semifinal(&bracket_id, a2, b2), created_at)?;
        Ok([first, second])
      })
      .await
  }

  async fn get_match(&self, match_id: Uuid) -> Result<Option<Match>> {
    self.read(move |conn| ops::select_match(conn, match_id)).await
  }

  async fn increment_tally(&self, match_id: Uuid, choice: Choice) -> Result<Match> {
    self
      .write(move |conn| ops::bump_tally(conn, match_id, choice))
      .await
  }

  async fn close_match(
    &self,
    match_id:  Uuid,
    winner:    String,
    closed_at: DateTime<Utc>,
  ) -> Result<Match> {
    self
      .write(move |conn| ops::close_row(conn, match_id, &winner, closed_at))
      .await
  }

  async fn find_open(&self, bracket_id: Option<String>) -> Result<Vec<Match>> {
    self
      .read(move |conn| ops::select_open(conn, bracket_id.as_deref(), &[], None))
      .await
  }

  async fn first_open(
    &self,
    bracket_id: Option<String>,
    exclude:    Vec<Uuid>,
  ) -> Result<Option<Match>> {
    let found = self
      .read(move |conn| ops::select_open(conn, bracket_id.as_deref(), &exclude, Some(1)))
      .await?;
    Ok(found.into_iter().next())
  }

  async fn find_closed(&self, bracket_id: String) -> Result<Vec<Match>> {
    self
      .read(move |conn| ops::select_closed(conn, &bracket_id))
      .await
  }

  async fn find_final(&self, bracket_id: String) -> Result<Option<Match>> {
    self
      .read(move |conn| ops::select_final(conn, &bracket_id))
      .await
  }

  async fn find_semifinals(&self, bracket_id: String) -> Result<Vec<Match>> {
    self
      .read(move |conn| ops::select_semifinals(conn, &bracket_id))
      .await
  }

  async fn delete_match(&self, match_id: Uuid) -> Result<Option<Match>> {
    self
      .write(move |conn| {
        let Some(found) = ops::select_match(conn, match_id)? else {
          return Ok(None);
        };
        ops::delete_rows(conn, std::slice::from_ref(&found))?;
        Ok(Some(found))
      })
      .await
  }

  async fn delete_all_for_bracket(&self, bracket_id: String) -> Result<Vec<Match>> {
    self
      .write(move |conn| {
        let matches = ops::select_bracket(conn, &bracket_id)?;
        ops::delete_rows(conn, &matches)?;
        Ok(matches)
      })
      .await
  }

  async fn list_brackets(&self) -> Result<Vec<BracketSummary>> {
    self.read(ops::select_summaries).await
  }

  // ── Compound operations ───────────────────────────────────────────────────

  async fn commit_vote(
    &self,
    ballot:    Ballot,
    threshold: NonZeroU32,
    at:        DateTime<Utc>,
  ) -> Result<VoteCommit> {
    self
      .write(move |conn| ops::commit_vote(conn, &ballot, threshold, at))
      .await
  }

  async fn synthesize_final(
    &self,
    bracket_id: String,
    at:         DateTime<Utc>,
  ) -> Result<FinalSynthesis> {
    self
      .write(move |conn| ops::synthesize(conn, &bracket_id, at))
      .await
  }

  async fn reset_match(&self, match_id: Uuid) -> Result<Option<Match>> {
    self
      .write(move |conn| {
        let Some(found) = ops::select_match(conn, match_id)? else {
          return Ok(None);
        };
        Ok(ops::reset_rows(conn, &[found])?.into_iter().next())
      })
      .await
  }

  async fn reset_bracket(&self, bracket_id: String) -> Result<Vec<Match>> {
    self
      .write(move |conn| {
        let matches = ops::select_bracket(conn, &bracket_id)?;
        ops::reset_rows(conn, &matches)
      })
      .await
  }
}
