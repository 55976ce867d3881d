//! Integration tests for `SqliteStore` against an in-memory database.

use std::num::NonZeroU32;

use chrono::{Duration, Utc};
use uuid::Uuid;
use versus_core::{
  Error as CoreError,
  bracket::FinalSynthesis,
  candidate::NewCandidate,
  matchup::{Choice, Match, NewMatch},
  store::BattleStore,
  vote::Ballot,
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn threshold(n: u32) -> NonZeroU32 { NonZeroU32::new(n).unwrap() }

fn ballot(voter: &str, match_id: Uuid, choice: Choice) -> Ballot {
  Ballot { match_id, voter_id: voter.into(), choice }
}

async fn semifinals(s: &SqliteStore, bracket_id: &str) -> [Match; 2] {
  s.create_semifinals(
    bracket_id.into(),
    [("p1".into(), "p2".into()), ("p3".into(), "p4".into())],
    Utc::now(),
  )
  .await
  .unwrap()
}

fn core_err(err: Error) -> CoreError { err.into() }

// ─── Candidates ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn register_and_get_candidate() {
  let s = store().await;
  let registered = s
    .register_candidate(NewCandidate { candidate_id: "p1".into(), author_id: "alice".into() })
    .await
    .unwrap();
  assert_eq!(registered.wins, 0);

  let fetched = s.get_candidate("p1".into()).await.unwrap().unwrap();
  assert_eq!(fetched, registered);
  assert!(s.get_candidate("missing".into()).await.unwrap().is_none());
}

#[tokio::test]
async fn register_candidate_twice_conflicts() {
  let s = store().await;
  let input = NewCandidate { candidate_id: "p1".into(), author_id: "alice".into() };
  s.register_candidate(input.clone()).await.unwrap();
  let err = s.register_candidate(input).await.unwrap_err();
  assert!(matches!(core_err(err), CoreError::CandidateExists(id) if id == "p1"));
}

#[tokio::test]
async fn increment_win_count_ignores_unknown() {
  let s = store().await;
  s.register_candidate(NewCandidate { candidate_id: "p1".into(), author_id: "alice".into() })
    .await
    .unwrap();
  s.increment_win_count("p1".into()).await.unwrap();
  s.increment_win_count("p1".into()).await.unwrap();
  s.increment_win_count("ghost".into()).await.unwrap();
  assert_eq!(s.get_candidate("p1".into()).await.unwrap().unwrap().wins, 2);
}

// ─── Vote ledger ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn record_vote_and_lookup() {
  let s = store().await;
  let [m, _] = semifinals(&s, "b1").await;

  let vote = s.record_vote("v1".into(), m.match_id, Choice::B).await.unwrap();
  assert_eq!(vote.choice, Choice::B);
  assert!(s.has_voted("v1".into(), m.match_id).await.unwrap());
  assert!(!s.has_voted("v2".into(), m.match_id).await.unwrap());
  assert_eq!(s.choice_of("v1".into(), m.match_id).await.unwrap(), Some(Choice::B));
  assert_eq!(s.choice_of("v2".into(), m.match_id).await.unwrap(), None);
}

#[tokio::test]
async fn record_vote_twice_is_duplicate() {
  let s = store().await;
  let [m, _] = semifinals(&s, "b1").await;
  s.record_vote("v1".into(), m.match_id, Choice::A).await.unwrap();

  let err = s.record_vote("v1".into(), m.match_id, Choice::B).await.unwrap_err();
  assert!(matches!(core_err(err), CoreError::DuplicateVote { .. }));
  // The first decision stands.
  assert_eq!(s.choice_of("v1".into(), m.match_id).await.unwrap(), Some(Choice::A));
}

#[tokio::test]
async fn record_vote_unknown_match_not_found() {
  let s = store().await;
  let err = s.record_vote("v1".into(), Uuid::new_v4(), Choice::A).await.unwrap_err();
  assert!(matches!(core_err(err), CoreError::MatchNotFound(_)));
}

#[tokio::test]
async fn distinct_matches_and_vote_deletion() {
  let s = store().await;
  let [m1, m2] = semifinals(&s, "b1").await;
  s.record_vote("v1".into(), m1.match_id, Choice::A).await.unwrap();
  s.record_vote("v1".into(), m2.match_id, Choice::B).await.unwrap();
  s.record_vote("v2".into(), m1.match_id, Choice::B).await.unwrap();

  let mut voted = s.distinct_matches_voted_on("v1".into()).await.unwrap();
  voted.sort();
  let mut expected = vec![m1.match_id, m2.match_id];
  expected.sort();
  assert_eq!(voted, expected);

  assert_eq!(s.delete_votes_for_match(m1.match_id).await.unwrap(), 2);
  assert_eq!(s.delete_votes_for_matches(vec![m1.match_id, m2.match_id]).await.unwrap(), 1);
  assert_eq!(s.delete_votes_for_matches(Vec::new()).await.unwrap(), 0);
  assert!(s.distinct_matches_voted_on("v1".into()).await.unwrap().is_empty());
}

// ─── Match store ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_semifinals_starts_open_and_empty() {
  let s = store().await;
  let [m1, m2] = semifinals(&s, "b1").await;

  for m in [&m1, &m2] {
    assert_eq!(m.bracket_id, "b1");
    assert_eq!((m.votes_a, m.votes_b), (0, 0));
    assert!(!m.is_final && !m.is_closed);
    assert!(m.winner.is_none() && m.closed_at.is_none());
  }
  assert_eq!((m1.candidate_a.as_str(), m1.candidate_b.as_str()), ("p1", "p2"));
  assert_eq!((m2.candidate_a.as_str(), m2.candidate_b.as_str()), ("p3", "p4"));

  let fetched = s.get_match(m1.match_id).await.unwrap().unwrap();
  assert_eq!(fetched, m1);
  assert!(s.get_match(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn third_semifinal_is_rejected() {
  let s = store().await;
  semifinals(&s, "b1").await;
  let err = s
    .create_match(NewMatch::semifinal("b1", "p5", "p6"), Utc::now())
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), CoreError::BracketFull(_)));
}

#[tokio::test]
async fn semifinal_cannot_reuse_candidate() {
  let s = store().await;
  s.create_match(NewMatch::semifinal("b1", "p1", "p2"), Utc::now()).await.unwrap();
  let err = s
    .create_match(NewMatch::semifinal("b1", "p3", "p1"), Utc::now())
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), CoreError::InvalidInput(_)));
}

#[tokio::test]
async fn final_requires_two_semifinals_and_is_unique() {
  let s = store().await;
  s.create_match(NewMatch::semifinal("b1", "p1", "p2"), Utc::now()).await.unwrap();
  let err = s
    .create_match(NewMatch::final_between("b1", "p1", "p3"), Utc::now())
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), CoreError::InvalidInput(_)));

  s.create_match(NewMatch::semifinal("b1", "p3", "p4"), Utc::now()).await.unwrap();
  s.create_match(NewMatch::final_between("b1", "p1", "p3"), Utc::now()).await.unwrap();
  let err = s
    .create_match(NewMatch::final_between("b1", "p2", "p4"), Utc::now())
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), CoreError::FinalAlreadyExists(_)));
}

#[tokio::test]
async fn increment_tally_and_close() {
  let s = store().await;
  let [m, _] = semifinals(&s, "b1").await;

  s.increment_tally(m.match_id, Choice::A).await.unwrap();
  let m2 = s.increment_tally(m.match_id, Choice::B).await.unwrap();
  let m3 = s.increment_tally(m.match_id, Choice::A).await.unwrap();
  assert_eq!((m2.votes_a, m2.votes_b), (1, 1));
  assert_eq!((m3.votes_a, m3.votes_b), (2, 1));

  let closed = s.close_match(m.match_id, "p1".into(), Utc::now()).await.unwrap();
  assert!(closed.is_closed);
  assert_eq!(closed.winner.as_deref(), Some("p1"));
  assert!(closed.closed_at.is_some());

  // Closing again is a no-op that never re-picks the winner.
  let again = s
    .close_match(m.match_id, "p2".into(), Utc::now() + Duration::seconds(5))
    .await
    .unwrap();
  assert_eq!(again, closed);

  // Tallies are frozen once closed.
  let err = s.increment_tally(m.match_id, Choice::A).await.unwrap_err();
  assert!(matches!(core_err(err), CoreError::MatchClosed(_)));
  assert_eq!(s.get_match(m.match_id).await.unwrap().unwrap().votes_a, 2);
}

#[tokio::test]
async fn close_match_rejects_foreign_winner() {
  let s = store().await;
  let [m, _] = semifinals(&s, "b1").await;
  let err = s.close_match(m.match_id, "p3".into(), Utc::now()).await.unwrap_err();
  assert!(matches!(core_err(err), CoreError::InvalidInput(_)));
}

#[tokio::test]
async fn increment_tally_unknown_match() {
  let s = store().await;
  let err = s.increment_tally(Uuid::new_v4(), Choice::A).await.unwrap_err();
  assert!(matches!(core_err(err), CoreError::MatchNotFound(_)));
}

#[tokio::test]
async fn open_and_closed_queries() {
  let s = store().await;
  let t0 = Utc::now();
  let [m1, m2] = semifinals(&s, "b1").await;
  let other = s
    .create_match(NewMatch::semifinal("b2", "q1", "q2"), t0 + Duration::seconds(1))
    .await
    .unwrap();

  let open = s.find_open(None).await.unwrap();
  assert_eq!(
    open.iter().map(|m| m.match_id).collect::<Vec<_>>(),
    vec![m1.match_id, m2.match_id, other.match_id]
  );
  assert_eq!(s.find_open(Some("b2".into())).await.unwrap().len(), 1);

  let first = s.first_open(None, vec![m1.match_id]).await.unwrap().unwrap();
  assert_eq!(first.match_id, m2.match_id);
  let none = s
    .first_open(Some("b1".into()), vec![m1.match_id, m2.match_id])
    .await
    .unwrap();
  assert!(none.is_none());

  s.close_match(m2.match_id, "p3".into(), t0 + Duration::seconds(2)).await.unwrap();
  s.close_match(m1.match_id, "p2".into(), t0 + Duration::seconds(3)).await.unwrap();
  let closed = s.find_closed("b1".into()).await.unwrap();
  assert_eq!(
    closed.iter().map(|m| m.match_id).collect::<Vec<_>>(),
    vec![m2.match_id, m1.match_id]
  );
  assert!(s.find_open(Some("b1".into())).await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_match_cascades_votes() {
  let s = store().await;
  let [m1, m2] = semifinals(&s, "b1").await;
  s.record_vote("v1".into(), m1.match_id, Choice::A).await.unwrap();

  let deleted = s.delete_match(m1.match_id).await.unwrap().unwrap();
  assert_eq!(deleted.match_id, m1.match_id);
  assert!(s.get_match(m1.match_id).await.unwrap().is_none());
  assert!(s.get_match(m2.match_id).await.unwrap().is_some());
  assert!(!s.has_voted("v1".into(), m1.match_id).await.unwrap());
  assert!(s.delete_match(m1.match_id).await.unwrap().is_none());
}

#[tokio::test]
async fn delete_all_for_bracket() {
  let s = store().await;
  semifinals(&s, "b1").await;
  semifinals(&s, "b2").await;

  let deleted = s.delete_all_for_bracket("b1".into()).await.unwrap();
  assert_eq!(deleted.len(), 2);
  assert!(s.find_semifinals("b1".into()).await.unwrap().is_empty());
  assert_eq!(s.find_semifinals("b2".into()).await.unwrap().len(), 2);
  assert!(s.delete_all_for_bracket("b1".into()).await.unwrap().is_empty());
}

#[tokio::test]
async fn list_brackets_newest_first() {
  let s = store().await;
  let t0 = Utc::now();
  let [m1, _] = s
    .create_semifinals(
      "old".into(),
      [("p1".into(), "p2".into()), ("p3".into(), "p4".into())],
      t0,
    )
    .await
    .unwrap();
  s.create_match(NewMatch::semifinal("new", "q1", "q2"), t0 + Duration::seconds(10))
    .await
    .unwrap();
  s.close_match(m1.match_id, "p1".into(), t0 + Duration::seconds(20)).await.unwrap();

  let summaries = s.list_brackets().await.unwrap();
  assert_eq!(summaries.len(), 2);
  assert_eq!(summaries[0].bracket_id, "new");
  assert_eq!(summaries[0].total_matches, 1);
  assert_eq!(summaries[1].bracket_id, "old");
  assert_eq!(summaries[1].total_matches, 2);
  assert_eq!(summaries[1].active_matches, 1);
  assert_eq!(summaries[1].completed_matches, 1);
}

// ─── Compound operations ─────────────────────────────────────────────────────

#[tokio::test]
async fn commit_vote_below_threshold_stays_open() {
  let s = store().await;
  let [m, _] = semifinals(&s, "b1").await;

  let commit = s
    .commit_vote(ballot("v1", m.match_id, Choice::A), threshold(3), Utc::now())
    .await
    .unwrap();
  assert!(!commit.closed);
  assert!(commit.final_synthesis.is_none());
  assert_eq!((commit.updated.votes_a, commit.updated.votes_b), (1, 0));
  assert!(s.has_voted("v1".into(), m.match_id).await.unwrap());
}

#[tokio::test]
async fn commit_vote_closes_at_threshold() {
  let s = store().await;
  for id in ["p1", "p2", "p3", "p4"] {
    s.register_candidate(NewCandidate { candidate_id: id.into(), author_id: "alice".into() })
      .await
      .unwrap();
  }
  let [m, _] = semifinals(&s, "b1").await;

  s.commit_vote(ballot("v1", m.match_id, Choice::B), threshold(3), Utc::now()).await.unwrap();
  s.commit_vote(ballot("v2", m.match_id, Choice::A), threshold(3), Utc::now()).await.unwrap();
  let commit = s
    .commit_vote(ballot("v3", m.match_id, Choice::B), threshold(3), Utc::now())
    .await
    .unwrap();

  assert!(commit.closed);
  assert_eq!(commit.updated.winner.as_deref(), Some("p2"));
  assert!(commit.updated.closed_at.is_some());
  // Only one semifinal closed, so the final is not ready.
  assert_eq!(commit.final_synthesis, Some(FinalSynthesis::NotReady));
  assert_eq!(s.get_candidate("p2".into()).await.unwrap().unwrap().wins, 1);
  assert_eq!(s.get_candidate("p1".into()).await.unwrap().unwrap().wins, 0);

  let err = s
    .commit_vote(ballot("v4", m.match_id, Choice::A), threshold(3), Utc::now())
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), CoreError::MatchClosed(_)));
  // The rejected vote left no trace in the ledger.
  assert!(!s.has_voted("v4".into(), m.match_id).await.unwrap());
}

#[tokio::test]
async fn commit_vote_duplicate_rolls_back() {
  let s = store().await;
  let [m, _] = semifinals(&s, "b1").await;
  s.commit_vote(ballot("v1", m.match_id, Choice::A), threshold(10), Utc::now()).await.unwrap();

  let err = s
    .commit_vote(ballot("v1", m.match_id, Choice::A), threshold(10), Utc::now())
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), CoreError::DuplicateVote { .. }));
  let current = s.get_match(m.match_id).await.unwrap().unwrap();
  assert_eq!((current.votes_a, current.votes_b), (1, 0));
}

#[tokio::test]
async fn tie_at_threshold_goes_to_b() {
  let s = store().await;
  let [m, _] = semifinals(&s, "b1").await;
  s.commit_vote(ballot("v1", m.match_id, Choice::A), threshold(2), Utc::now()).await.unwrap();
  let commit = s
    .commit_vote(ballot("v2", m.match_id, Choice::B), threshold(2), Utc::now())
    .await
    .unwrap();
  assert!(commit.closed);
  assert_eq!(commit.updated.winner.as_deref(), Some("p2"));
}

#[tokio::test]
async fn closing_both_semifinals_creates_final() {
  let s = store().await;
  let [m1, m2] = semifinals(&s, "b1").await;

  let first = s
    .commit_vote(ballot("v1", m1.match_id, Choice::A), threshold(1), Utc::now())
    .await
    .unwrap();
  assert_eq!(first.final_synthesis, Some(FinalSynthesis::NotReady));

  let second = s
    .commit_vote(ballot("v1", m2.match_id, Choice::B), threshold(1), Utc::now())
    .await
    .unwrap();
  let Some(FinalSynthesis::Created(final_match)) = second.final_synthesis else {
    panic!("expected a created final, got {:?}", second.final_synthesis);
  };
  assert!(final_match.is_final);
  assert_eq!(final_match.candidate_a, "p1");
  assert_eq!(final_match.candidate_b, "p4");

  // Synthesis is idempotent.
  let again = s.synthesize_final("b1".into(), Utc::now()).await.unwrap();
  assert_eq!(again, FinalSynthesis::Existing(final_match.clone()));
  assert_eq!(s.find_final("b1".into()).await.unwrap(), Some(final_match));
}

#[tokio::test]
async fn closing_the_final_does_not_synthesize() {
  let s = store().await;
  let [m1, m2] = semifinals(&s, "b1").await;
  s.commit_vote(ballot("v1", m1.match_id, Choice::A), threshold(1), Utc::now()).await.unwrap();
  let commit = s
    .commit_vote(ballot("v1", m2.match_id, Choice::A), threshold(1), Utc::now())
    .await
    .unwrap();
  let final_match = commit.final_synthesis.unwrap().final_match().cloned().unwrap();

  let commit = s
    .commit_vote(ballot("v1", final_match.match_id, Choice::A), threshold(1), Utc::now())
    .await
    .unwrap();
  assert!(commit.closed);
  assert!(commit.final_synthesis.is_none());
  assert_eq!(commit.updated.winner.as_deref(), Some("p1"));
}

#[tokio::test]
async fn synthesize_final_not_ready() {
  let s = store().await;
  assert_eq!(
    s.synthesize_final("empty".into(), Utc::now()).await.unwrap(),
    FinalSynthesis::NotReady
  );
  let [m1, _] = semifinals(&s, "b1").await;
  s.close_match(m1.match_id, "p1".into(), Utc::now()).await.unwrap();
  assert_eq!(
    s.synthesize_final("b1".into(), Utc::now()).await.unwrap(),
    FinalSynthesis::NotReady
  );
  assert!(s.find_final("b1".into()).await.unwrap().is_none());
}

#[tokio::test]
async fn reset_match_reopens_and_forgets_votes() {
  let s = store().await;
  let [m1, m2] = semifinals(&s, "b1").await;
  s.commit_vote(ballot("v1", m1.match_id, Choice::A), threshold(1), Utc::now()).await.unwrap();
  s.commit_vote(ballot("v1", m2.match_id, Choice::A), threshold(1), Utc::now()).await.unwrap();
  assert!(s.find_final("b1".into()).await.unwrap().is_some());

  let reset = s.reset_match(m1.match_id).await.unwrap().unwrap();
  assert!(!reset.is_closed);
  assert_eq!((reset.votes_a, reset.votes_b), (0, 0));
  assert!(reset.winner.is_none() && reset.closed_at.is_none());
  assert!(!s.has_voted("v1".into(), m1.match_id).await.unwrap());
  assert!(s.has_voted("v1".into(), m2.match_id).await.unwrap());
  // The final survives a semifinal reset.
  assert!(s.find_final("b1".into()).await.unwrap().is_some());

  assert!(s.reset_match(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn reset_bracket_reopens_everything() {
  let s = store().await;
  let [m1, m2] = semifinals(&s, "b1").await;
  s.commit_vote(ballot("v1", m1.match_id, Choice::A), threshold(1), Utc::now()).await.unwrap();
  s.commit_vote(ballot("v2", m2.match_id, Choice::B), threshold(1), Utc::now()).await.unwrap();

  let reset = s.reset_bracket("b1".into()).await.unwrap();
  assert_eq!(reset.len(), 3);
  assert!(reset.iter().all(|m| !m.is_closed && m.total_votes() == 0));
  assert!(s.distinct_matches_voted_on("v1".into()).await.unwrap().is_empty());
  assert!(s.distinct_matches_voted_on("v2".into()).await.unwrap().is_empty());
  assert!(s.reset_bracket("missing".into()).await.unwrap().is_empty());
}

// ─── Concurrency ─────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_duplicate_votes_record_once() {
  let s = store().await;
  let [m, _] = semifinals(&s, "b1").await;
  let match_id = m.match_id;

  let handles: Vec<_> = (0..16)
    .map(|_| {
      let s = s.clone();
      tokio::spawn(async move {
        s.commit_vote(ballot("v1", match_id, Choice::A), threshold(100), Utc::now())
          .await
      })
    })
    .collect();

  let mut ok = 0;
  let mut duplicates = 0;
  for handle in handles {
    match handle.await.unwrap().map_err(core_err) {
      Ok(_) => ok += 1,
      Err(CoreError::DuplicateVote { .. }) => duplicates += 1,
      Err(other) => panic!("unexpected error: {other}"),
    }
  }
  assert_eq!(ok, 1);
  assert_eq!(duplicates, 15);
  assert_eq!(s.get_match(m.match_id).await.unwrap().unwrap().votes_a, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_threshold_crossing_closes_once() {
  let s = store().await;
  let [m, _] = semifinals(&s, "b1").await;
  let match_id = m.match_id;

  let handles: Vec<_> = (0..12)
    .map(|i| {
      let s = s.clone();
      tokio::spawn(async move {
        s.commit_vote(ballot(&format!("v{i}"), match_id, Choice::A), threshold(5), Utc::now())
          .await
      })
    })
    .collect();

  let mut accepted = 0;
  let mut closures = 0;
  let mut rejected = 0;
  for handle in handles {
    match handle.await.unwrap().map_err(core_err) {
      Ok(commit) => {
        accepted += 1;
        closures += usize::from(commit.closed);
      }
      Err(CoreError::MatchClosed(_)) => rejected += 1,
      Err(other) => panic!("unexpected error: {other}"),
    }
  }
  assert_eq!(accepted, 5);
  assert_eq!(closures, 1);
  assert_eq!(rejected, 7);

  let stored = s.get_match(m.match_id).await.unwrap().unwrap();
  assert!(stored.is_closed);
  assert_eq!(stored.total_votes(), 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_semifinal_closures_create_one_final() {
  let s = store().await;
  let [m1, m2] = semifinals(&s, "b1").await;

  let handles: Vec<_> = [m1.match_id, m2.match_id]
    .into_iter()
    .map(|match_id| {
      let s = s.clone();
      tokio::spawn(async move {
        s.commit_vote(ballot("v1", match_id, Choice::A), threshold(1), Utc::now())
          .await
      })
    })
    .collect();

  let mut created = 0;
  for handle in handles {
    let commit = handle.await.unwrap().unwrap();
    assert!(commit.closed);
    if matches!(commit.final_synthesis, Some(FinalSynthesis::Created(_))) {
      created += 1;
    }
  }
  assert_eq!(created, 1);

  let matches = s.find_open(Some("b1".into())).await.unwrap();
  assert_eq!(matches.len(), 1);
  assert!(matches[0].is_final);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_synthesis_is_idempotent() {
  let s = store().await;
  let [m1, m2] = semifinals(&s, "b1").await;
  s.close_match(m1.match_id, "p1".into(), Utc::now()).await.unwrap();
  s.close_match(m2.match_id, "p3".into(), Utc::now()).await.unwrap();

  let handles: Vec<_> = (0..8)
    .map(|_| {
      let s = s.clone();
      tokio::spawn(async move { s.synthesize_final("b1".into(), Utc::now()).await })
    })
    .collect();

  let mut finals = Vec::new();
  for handle in handles {
    let outcome = handle.await.unwrap().unwrap();
    finals.push(outcome.final_match().cloned().unwrap().match_id);
  }
  finals.dedup();
  assert_eq!(finals.len(), 1);
}
