//! Process-wide notification fan-out.
//!
//! One [`Broadcaster`] is created at server start and handed to the engine as
//! its [`Publisher`]. Every WebSocket connection holds a [`Subscription`] that
//! receives global events plus events for the bracket and author rooms it has
//! joined. Slow subscribers lose events; nothing is replayed.

use std::collections::HashSet;

use tokio::sync::broadcast;
use tracing::{debug, warn};
use versus_core::event::{Event, Publisher, Scope};

/// An event together with the audience it was addressed to.
#[derive(Debug, Clone)]
struct Envelope {
  event: Event,
  scope: Scope,
}

#[derive(Clone)]
pub struct Broadcaster {
  tx: broadcast::Sender<Envelope>,
}

impl Broadcaster {
  pub fn new(capacity: usize) -> Self {
    let (tx, _) = broadcast::channel(capacity.max(1));
    Self { tx }
  }

  /// Open a subscription that starts out in no rooms.
  pub fn subscribe(&self) -> Subscription {
    Subscription {
      rx:       self.tx.subscribe(),
      brackets: HashSet::new(),
      authors:  HashSet::new(),
    }
  }

  pub fn subscriber_count(&self) -> usize { self.tx.receiver_count() }
}

impl Publisher for Broadcaster {
  fn publish(&self, event: &Event, scope: Scope) {
    // An error only means nobody is listening right now.
    if self.tx.send(Envelope { event: event.clone(), scope }).is_err() {
      debug!(event = event.name(), "no subscribers");
    }
  }
}

// ─── Subscription ────────────────────────────────────────────────────────────

pub struct Subscription {
  rx:       broadcast::Receiver<Envelope>,
  brackets: HashSet<String>,
  authors:  HashSet<String>,
}

impl Subscription {
  pub fn join_bracket(&mut self, bracket_id: String) { self.brackets.insert(bracket_id); }

  pub fn leave_bracket(&mut self, bracket_id: &str) { self.brackets.remove(bracket_id); }

  pub fn join_author(&mut self, author_id: String) { self.authors.insert(author_id); }

  pub fn leave_author(&mut self, author_id: &str) { self.authors.remove(author_id); }

  fn wants(&self, scope: &Scope) -> bool {
    match scope {
      Scope::Global => true,
      Scope::Bracket(id) => self.brackets.contains(id),
      Scope::Author(id) => self.authors.contains(id),
    }
  }

  /// Wait for the next event addressed to this subscription. Returns `None`
  /// once the broadcaster is gone.
  ///
  /// Cancel-safe: dropping the future never loses a matching event.
  pub async fn recv(&mut self) -> Option<Event> {
    loop {
      match self.rx.recv().await {
        Ok(envelope) if self.wants(&envelope.scope) => return Some(envelope.event),
        Ok(_) => continue,
        Err(broadcast::error::RecvError::Lagged(skipped)) => {
          warn!(skipped, "subscriber lagging, events dropped");
        }
        Err(broadcast::error::RecvError::Closed) => return None,
      }
    }
  }
}
