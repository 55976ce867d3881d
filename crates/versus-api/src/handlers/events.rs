//! `GET /events`: the WebSocket event stream.
//!
//! Server → client frames are serialized [`Event`]s. Client → server frames
//! are room commands:
//!
//! ```json
//! {"action":"join_bracket","bracket_id":"bracket_…"}
//! {"action":"leave_bracket","bracket_id":"bracket_…"}
//! {"action":"join_user","user_id":"alice"}
//! {"action":"leave_user","user_id":"alice"}
//! ```

use axum::{
  extract::{
    State,
    ws::{Message, WebSocket, WebSocketUpgrade},
  },
  response::Response,
};
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;
use versus_core::{event::Event, store::BattleStore};

use crate::{AppState, fanout::Subscription};

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientCommand {
  JoinBracket { bracket_id: String },
  LeaveBracket { bracket_id: String },
  JoinUser { user_id: String },
  LeaveUser { user_id: String },
}

impl ClientCommand {
  fn apply(self, sub: &mut Subscription) {
    match self {
      Self::JoinBracket { bracket_id } => sub.join_bracket(bracket_id),
      Self::LeaveBracket { bracket_id } => sub.leave_bracket(&bracket_id),
      Self::JoinUser { user_id } => sub.join_author(user_id),
      Self::LeaveUser { user_id } => sub.leave_author(&user_id),
    }
  }
}

pub async fn handler<S>(ws: WebSocketUpgrade, State(state): State<AppState<S>>) -> Response
where
  S: BattleStore + Clone + 'static,
{
  let subscription = state.fanout.subscribe();
  ws.on_upgrade(move |socket| serve(socket, subscription))
}

async fn serve(mut socket: WebSocket, mut sub: Subscription) {
  let client_id = Uuid::new_v4();
  info!(%client_id, "event stream opened");

  loop {
    tokio::select! {
      incoming = socket.recv() => match incoming {
        Some(Ok(Message::Text(text))) => {
          match serde_json::from_str::<ClientCommand>(text.as_str()) {
            Ok(command) => {
              debug!(%client_id, ?command, "client command");
              command.apply(&mut sub);
            }
            Err(e) => warn!(%client_id, error = %e, "ignoring malformed client command"),
          }
        }
        Some(Ok(Message::Close(_))) | None => break,
        // axum answers pings on its own.
        Some(Ok(_)) => {}
        Some(Err(e)) => {
          warn!(%client_id, error = %e, "socket error");
          break;
        }
      },
      outgoing = sub.recv() => {
        let Some(event) = outgoing else { break };
        if let Err(e) = send_event(&mut socket, &event).await {
          warn!(%client_id, error = %e, "failed to push event");
          break;
        }
      }
    }
  }

  info!(%client_id, "event stream closed");
}

async fn send_event(socket: &mut WebSocket, event: &Event) -> Result<(), axum::Error> {
  let json = serde_json::to_string(event).map_err(axum::Error::new)?;
  socket.send(Message::Text(json.into())).await
}
