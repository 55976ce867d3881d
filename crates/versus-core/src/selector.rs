//! Read-side match queries. The selector never mutates the store.

use uuid::Uuid;

use crate::{
  Error, Result,
  matchup::{Choice, Match},
  store::{BattleStore, lift},
};

pub struct MatchSelector<'a, S> {
  store: &'a S,
}

impl<'a, S: BattleStore> MatchSelector<'a, S> {
  pub fn new(store: &'a S) -> Self { Self { store } }

  /// The earliest-created open match, optionally within one bracket, that
  /// `voter_id` has not voted on yet.
  ///
  /// When the earliest open match turns out to be one the voter already
  /// decided, the query is repeated excluding every match the voter has
  /// voted on, not just that one.
  pub async fn next_match(
    &self,
    bracket_id: Option<&str>,
    voter_id: Option<&str>,
  ) -> Result<Option<Match>> {
    let bracket_id = bracket_id.map(str::to_owned);
    let first = self
      .store
      .first_open(bracket_id.clone(), Vec::new())
      .await
      .map_err(lift)?;

    let (Some(candidate), Some(voter_id)) = (first.as_ref(), voter_id) else {
      return Ok(first);
    };

    let already_voted = self
      .store
      .has_voted(voter_id.to_owned(), candidate.match_id)
      .await
      .map_err(lift)?;
    if !already_voted {
      return Ok(first);
    }

    let voted = self
      .store
      .distinct_matches_voted_on(voter_id.to_owned())
      .await
      .map_err(lift)?;
    self
      .store
      .first_open(bracket_id, voted)
      .await
      .map_err(lift)
  }

  /// Open matches of a bracket: semifinals before the final, then creation
  /// order.
  pub async fn active_matches(&self, bracket_id: &str) -> Result<Vec<Match>> {
    let mut matches = self
      .store
      .find_open(Some(bracket_id.to_owned()))
      .await
      .map_err(lift)?;
    // Stable sort keeps creation order within each group.
    matches.sort_by_key(|m| m.is_final);
    Ok(matches)
  }

  /// Closed matches of a bracket by closure time.
  pub async fn completed_matches(&self, bracket_id: &str) -> Result<Vec<Match>> {
    self
      .store
      .find_closed(bracket_id.to_owned())
      .await
      .map_err(lift)
  }

  /// The voter's own choice on a match, or `None` if they have not voted.
  pub async fn choice_of(&self, voter_id: &str, match_id: Uuid) -> Result<Option<Choice>> {
    self
      .store
      .get_match(match_id)
      .await
      .map_err(lift)?
      .ok_or(Error::MatchNotFound(match_id))?;
    self
      .store
      .choice_of(voter_id.to_owned(), match_id)
      .await
      .map_err(lift)
  }
}
