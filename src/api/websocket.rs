//! WebSocket feed of token notifications
//!
//! Clients connect to `/ws`, optionally with `?from=N`, and first receive the
//! logged notifications from sequence `N` onwards, then every notification as
//! it is committed. Sequence numbers let a client resume after a disconnect.

use crate::api::handlers::{ApiState, EventInfo};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use futures::{Sink, SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Maximum number of events to buffer per subscriber
const BROADCAST_CAPACITY: usize = 256;

/// Messages pushed to WebSocket clients
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum WsEvent {
    /// A notification was committed (or replayed from the log)
    TokenEvent { event: EventInfo },
    /// Connection established; `next_seq` is the first live sequence number
    Connected { symbol: String, next_seq: u64 },
    /// The client fell behind and missed notifications; resume with `from`
    Lagged { missed: u64 },
    /// Heartbeat to keep connection alive
    Ping,
}

/// Fan-out of committed notifications to every connected client
#[derive(Debug)]
pub struct WsBroadcaster {
    sender: broadcast::Sender<WsEvent>,
}

impl WsBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { sender }
    }

    /// Send to all connected clients. Dropped when nobody is listening.
    pub fn broadcast(&self, event: WsEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WsEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for WsBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct WsQuery {
    /// Replay the log from this sequence number before streaming
    pub from: Option<u64>,
}

/// GET /ws - Upgrade to the notification feed
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<ApiState>,
    Query(query): Query<WsQuery>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, query.from))
}

/// Subscribe, then snapshot the backlog under the read lock. Anything
/// committed in between arrives on the channel too and is skipped by `seq`.
async fn opening_messages(
    state: &ApiState,
    from: Option<u64>,
) -> (broadcast::Receiver<WsEvent>, Vec<WsEvent>, u64) {
    let rx = state.ws_broadcaster.subscribe();
    let contract = state.contract.read().await;
    let next_seq = contract.events().len() as u64;

    let mut opening = vec![WsEvent::Connected {
        symbol: contract.symbol().to_string(),
        next_seq,
    }];
    if let Some(from) = from {
        opening.extend(
            contract
                .events_since(from)
                .iter()
                .map(|record| WsEvent::TokenEvent {
                    event: EventInfo::from(record),
                }),
        );
    }

    (rx, opening, next_seq)
}

async fn handle_socket(socket: WebSocket, state: ApiState, from: Option<u64>) {
    let (mut sender, mut receiver) = socket.split();
    let (mut rx, opening, mut next_seq) = opening_messages(&state, from).await;

    log::info!(
        "WebSocket client connected (replay from {:?}, live from {})",
        from,
        next_seq
    );

    let mut send_task = tokio::spawn(async move {
        for event in opening {
            if send_json(&mut sender, &event).await.is_err() {
                return;
            }
        }

        loop {
            let event = match rx.recv().await {
                Ok(WsEvent::TokenEvent { event }) if event.seq < next_seq => continue,
                Ok(WsEvent::TokenEvent { event }) => {
                    next_seq = event.seq + 1;
                    WsEvent::TokenEvent { event }
                }
                Ok(other) => other,
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    log::warn!("WebSocket client lagged, {} messages dropped", missed);
                    WsEvent::Lagged { missed }
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };

            if send_json(&mut sender, &event).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => break,
                Ok(Message::Text(text)) => {
                    log::debug!("Ignoring client message: {}", text);
                }
                Err(e) => {
                    log::warn!("WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    log::info!("WebSocket connection closed");
}

async fn send_json<S>(sender: &mut S, event: &WsEvent) -> Result<(), ()>
where
    S: Sink<Message> + Unpin,
{
    let json = serde_json::to_string(event).map_err(|_| ())?;
    sender
        .send(Message::Text(json.into()))
        .await
        .map_err(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::EventBody;
    use crate::contract::{TokenConfig, TokenContract};
    use crate::core::Address;
    use crate::storage::{Storage, StorageConfig};

    fn test_state(dir: &tempfile::TempDir) -> ApiState {
        let config = TokenConfig {
            signers: vec![Address::new([1; 20])],
            ..Default::default()
        };
        let contract = TokenContract::deploy(Address::new([10; 20]), config).unwrap();
        let storage = Storage::new(StorageConfig::in_dir(dir.path())).unwrap();
        ApiState::new(contract, storage)
    }

    #[test]
    fn test_broadcast_with_no_subscribers() {
        let broadcaster = WsBroadcaster::new();
        assert_eq!(broadcaster.subscriber_count(), 0);
        broadcaster.broadcast(WsEvent::Ping);
    }

    #[test]
    fn test_event_serialization() {
        let event = WsEvent::TokenEvent {
            event: EventInfo {
                seq: 7,
                timestamp: "2024-01-01T00:00:00+00:00".to_string(),
                body: EventBody::TransactionExecuted { id: 3 },
            },
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"TokenEvent\""));
        assert!(json.contains("\"event\":\"TransactionExecuted\""));
        assert!(json.contains("\"seq\":7"));
    }

    #[tokio::test]
    async fn test_subscriber_receives_broadcast() {
        let broadcaster = WsBroadcaster::new();
        let mut rx = broadcaster.subscribe();
        assert_eq!(broadcaster.subscriber_count(), 1);

        broadcaster.broadcast(WsEvent::Ping);
        assert!(matches!(rx.recv().await.unwrap(), WsEvent::Ping));
    }

    #[tokio::test]
    async fn test_opening_messages_replay_backlog() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let logged = state.contract.read().await.events().len() as u64;

        let (_rx, opening, next_seq) = opening_messages(&state, Some(1)).await;
        assert_eq!(next_seq, logged);
        assert!(matches!(
            &opening[0],
            WsEvent::Connected { symbol, next_seq } if symbol == "F42T" && *next_seq == logged
        ));
        assert_eq!(opening.len() as u64, 1 + logged - 1);
        assert!(matches!(
            &opening[1],
            WsEvent::TokenEvent { event } if event.seq == 1
        ));

        let (_rx, opening, _) = opening_messages(&state, None).await;
        assert_eq!(opening.len(), 1);
        assert_eq!(state.ws_broadcaster.subscriber_count(), 2);
    }
}
