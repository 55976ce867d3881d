//! The bracket progression engine.
//!
//! [`BracketEngine`] is the only writer of match and vote state. Every
//! mutation goes through one atomic [`BattleStore`] call; events are published
//! afterwards, in the order listed on each operation, and publishing can never
//! fail or undo the mutation.

use std::{collections::BTreeSet, num::NonZeroU32};

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
  Error, Result,
  bracket::{
    self, BracketStage, BracketSummary, BracketView, FinalSynthesis,
    SeededBracket,
  },
  candidate::{Candidate, NewCandidate},
  event::{Event, Publisher, Scope},
  matchup::{Match, NewMatch},
  selector::MatchSelector,
  store::{BattleStore, lift},
  vote::Ballot,
};

/// Result of [`BracketEngine::cast_vote`].
#[derive(Debug, Clone, Serialize)]
pub struct VoteReceipt {
  /// The match after the vote and any closure it caused.
  #[serde(rename = "match")]
  pub updated:     Match,
  /// `true` when this vote closed the match.
  pub closed:      bool,
  /// The final created because this vote closed the last open semifinal.
  pub final_match: Option<Match>,
}

pub struct BracketEngine<S, P> {
  store:          S,
  publisher:      P,
  vote_threshold: NonZeroU32,
}

impl<S: BattleStore, P: Publisher> BracketEngine<S, P> {
  pub fn new(store: S, publisher: P, vote_threshold: NonZeroU32) -> Self {
    Self { store, publisher, vote_threshold }
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn vote_threshold(&self) -> NonZeroU32 { self.vote_threshold }

  pub fn selector(&self) -> MatchSelector<'_, S> { MatchSelector::new(&self.store) }

  // ── Candidates ──────────────────────────────────────────────────────────

  pub async fn register_candidate(&self, input: NewCandidate) -> Result<Candidate> {
    bracket::ensure_distinct(std::slice::from_ref(&input.candidate_id))?;
    if input.author_id.trim().is_empty() {
      return Err(Error::InvalidInput("author id must not be empty".into()));
    }
    self.store.register_candidate(input).await.map_err(lift)
  }

  pub async fn candidate(&self, candidate_id: &str) -> Result<Candidate> {
    self
      .store
      .get_candidate(candidate_id.to_owned())
      .await
      .map_err(lift)?
      .ok_or_else(|| Error::CandidateNotFound(candidate_id.to_owned()))
  }

  /// Look up every candidate, failing on the first unknown id.
  async fn require_candidates(&self, candidate_ids: &[String]) -> Result<Vec<Candidate>> {
    let mut found = Vec::with_capacity(candidate_ids.len());
    for id in candidate_ids {
      let candidate = self
        .store
        .get_candidate(id.clone())
        .await
        .map_err(lift)?
        .ok_or_else(|| Error::CandidateNotFound(id.clone()))?;
      found.push(candidate);
    }
    Ok(found)
  }

  // ── Bracket creation ────────────────────────────────────────────────────

  /// Seed a new bracket from exactly four candidates.
  ///
  /// Emits `match.created` to each involved author and globally, then
  /// `bracket.created` globally.
  pub async fn create_semifinals(&self, candidate_ids: &[String]) -> Result<SeededBracket> {
    let pairs = bracket::seed_pairs(candidate_ids)?;
    let candidates = self.require_candidates(candidate_ids).await?;

    let bracket_id = bracket::new_bracket_id();
    let matches = self
      .store
      .create_semifinals(bracket_id.clone(), pairs, Utc::now())
      .await
      .map_err(lift)?;

    info!(%bracket_id, "created semifinals");
    self.announce_created(&bracket_id, &matches, &candidates);

    Ok(SeededBracket { bracket_id, matches })
  }

  /// Administrative single-match creation under an operator-chosen bracket
  /// id, bypassing four-candidate seeding. Emits the same events as seeding.
  pub async fn create_match(
    &self,
    bracket_id: &str,
    candidate_a: &str,
    candidate_b: &str,
    is_final: bool,
  ) -> Result<Match> {
    if bracket_id.trim().is_empty() {
      return Err(Error::InvalidInput("bracket id must not be empty".into()));
    }
    let ids = [candidate_a.to_owned(), candidate_b.to_owned()];
    bracket::ensure_distinct(&ids)?;
    let candidates = self.require_candidates(&ids).await?;

    let input = NewMatch {
      bracket_id: bracket_id.to_owned(),
      candidate_a: candidate_a.to_owned(),
      candidate_b: candidate_b.to_owned(),
      is_final,
    };
    let created = self
      .store
      .create_match(input, Utc::now())
      .await
      .map_err(lift)?;

    info!(%bracket_id, match_id = %created.match_id, is_final, "created match");
    self.announce_created(bracket_id, std::slice::from_ref(&created), &candidates);

    Ok(created)
  }

  fn announce_created(&self, bracket_id: &str, matches: &[Match], candidates: &[Candidate]) {
    let event = Event::MatchCreated {
      bracket_id: bracket_id.to_owned(),
      match_ids:  matches.iter().map(|m| m.match_id).collect(),
    };
    let authors: BTreeSet<&str> = candidates.iter().map(|c| c.author_id.as_str()).collect();
    for author in authors {
      self.publish(&event, Scope::Author(author.to_owned()));
    }
    self.publish(&event, Scope::Global);
    self.publish(
      &Event::BracketCreated { bracket_id: bracket_id.to_owned() },
      Scope::Global,
    );
  }

  // ── Voting ──────────────────────────────────────────────────────────────

  /// Record a vote and drive the match (and its bracket) forward.
  ///
  /// Emits `match.updated`, then `match.closed` if the vote closed the match,
  /// then `final.created` if closing it produced the bracket's final. Each
  /// goes to the bracket scope and globally.
  pub async fn cast_vote(&self, ballot: Ballot) -> Result<VoteReceipt> {
    if ballot.voter_id.trim().is_empty() {
      return Err(Error::InvalidInput("voter id must not be empty".into()));
    }
    let commit = self
      .store
      .commit_vote(ballot.clone(), self.vote_threshold, Utc::now())
      .await
      .map_err(lift)?;

    let updated = commit.updated;
    debug!(
      match_id = %updated.match_id,
      voter_id = %ballot.voter_id,
      choice = ballot.choice.as_str(),
      votes_a = updated.votes_a,
      votes_b = updated.votes_b,
      "vote recorded"
    );

    let bracket_scope = Scope::Bracket(updated.bracket_id.clone());
    self.publish_to(&Event::updated(&updated), &bracket_scope);

    if commit.closed {
      info!(
        match_id = %updated.match_id,
        bracket_id = %updated.bracket_id,
        winner = updated.winner.as_deref().unwrap_or_default(),
        total_votes = updated.total_votes(),
        "match closed"
      );
      self.publish_to(&Event::closed(&updated), &bracket_scope);
    }

    let final_match = commit
      .final_synthesis
      .as_ref()
      .and_then(FinalSynthesis::created)
      .cloned();
    if let Some(f) = &final_match {
      info!(bracket_id = %f.bracket_id, match_id = %f.match_id, "created final");
      self.publish_to(&Event::final_created(f), &bracket_scope);
    }

    Ok(VoteReceipt { updated, closed: commit.closed, final_match })
  }

  /// Create the bracket's final if both semifinals are closed. Returns the
  /// existing final unchanged if there already is one.
  pub async fn synthesize_final_if_ready(&self, bracket_id: &str) -> Result<FinalSynthesis> {
    let outcome = self
      .store
      .synthesize_final(bracket_id.to_owned(), Utc::now())
      .await
      .map_err(lift)?;
    if let Some(f) = outcome.created() {
      info!(%bracket_id, match_id = %f.match_id, "created final");
      self.publish_to(&Event::final_created(f), &Scope::Bracket(bracket_id.to_owned()));
    }
    Ok(outcome)
  }

  // ── Administrative resets and deletions ─────────────────────────────────

  /// Reopen a match with zero tallies and forget its votes. A final that was
  /// already synthesized from it is left in place.
  pub async fn reset_match(&self, match_id: Uuid) -> Result<Match> {
    let reset = self
      .store
      .reset_match(match_id)
      .await
      .map_err(lift)?
      .ok_or(Error::MatchNotFound(match_id))?;
    info!(%match_id, bracket_id = %reset.bracket_id, "reset match");
    self.publish_reset(&reset);
    Ok(reset)
  }

  pub async fn reset_bracket(&self, bracket_id: &str) -> Result<Vec<Match>> {
    let reset = self
      .store
      .reset_bracket(bracket_id.to_owned())
      .await
      .map_err(lift)?;
    if reset.is_empty() {
      return Err(Error::BracketNotFound(bracket_id.to_owned()));
    }
    info!(%bracket_id, matches = reset.len(), "reset bracket");
    for m in &reset {
      self.publish_reset(m);
    }
    Ok(reset)
  }

  fn publish_reset(&self, m: &Match) {
    self.publish(&Event::reset(m), Scope::Bracket(m.bracket_id.clone()));
  }

  pub async fn delete_match(&self, match_id: Uuid) -> Result<Match> {
    let deleted = self
      .store
      .delete_match(match_id)
      .await
      .map_err(lift)?
      .ok_or(Error::MatchNotFound(match_id))?;
    info!(%match_id, bracket_id = %deleted.bracket_id, "deleted match");
    self.publish(
      &Event::MatchDeleted { match_id, bracket_id: deleted.bracket_id.clone() },
      Scope::Bracket(deleted.bracket_id.clone()),
    );
    Ok(deleted)
  }

  /// Delete a bracket with all its matches and votes. Returns how many
  /// matches were removed.
  pub async fn delete_bracket(&self, bracket_id: &str) -> Result<usize> {
    let deleted = self
      .store
      .delete_all_for_bracket(bracket_id.to_owned())
      .await
      .map_err(lift)?;
    if deleted.is_empty() {
      return Err(Error::BracketNotFound(bracket_id.to_owned()));
    }
    info!(%bracket_id, matches = deleted.len(), "deleted bracket");
    self.publish(
      &Event::BracketDeleted {
        bracket_id:    bracket_id.to_owned(),
        matches_count: deleted.len(),
      },
      Scope::Bracket(bracket_id.to_owned()),
    );
    Ok(deleted.len())
  }

  // ── Reads ───────────────────────────────────────────────────────────────

  pub async fn get_match(&self, match_id: Uuid) -> Result<Match> {
    self
      .store
      .get_match(match_id)
      .await
      .map_err(lift)?
      .ok_or(Error::MatchNotFound(match_id))
  }

  /// Materialise a bracket's current state from its matches.
  pub async fn bracket(&self, bracket_id: &str) -> Result<BracketView> {
    let semifinals = self
      .store
      .find_semifinals(bracket_id.to_owned())
      .await
      .map_err(lift)?;
    let final_match = self
      .store
      .find_final(bracket_id.to_owned())
      .await
      .map_err(lift)?;
    if semifinals.is_empty() && final_match.is_none() {
      return Err(Error::BracketNotFound(bracket_id.to_owned()));
    }
    Ok(BracketView {
      bracket_id: bracket_id.to_owned(),
      stage: BracketStage::derive(&semifinals, final_match.as_ref()),
      semifinals,
      final_match,
    })
  }

  pub async fn brackets(&self) -> Result<Vec<BracketSummary>> {
    self.store.list_brackets().await.map_err(lift)
  }

  // ── Publishing ──────────────────────────────────────────────────────────

  fn publish(&self, event: &Event, scope: Scope) {
    debug!(event = event.name(), ?scope, "publish");
    self.publisher.publish(event, scope);
  }

  /// Publish to one bracket and globally.
  fn publish_to(&self, event: &Event, bracket_scope: &Scope) {
    self.publish(event, bracket_scope.clone());
    self.publish(event, Scope::Global);
  }
}
