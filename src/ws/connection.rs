//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single WebSocket connection:
//! sends the current overlay and knock set on connect, dispatches
//! subscription commands, and forwards filtered map messages.

use axum::extract::ws::{Message, WebSocket};
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{WsCommand, WsMessage, WsMessageType};
use super::subscription::SubscriptionManager;
use crate::app_state::AppState;
use crate::domain::MapMessage;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Sends the current contours and a full knock snapshot first.
/// - Reads commands from the client and dispatches them.
/// - Forwards matching messages from the [`broadcast::Receiver`].
pub async fn run_connection(
    socket: WebSocket,
    mut event_rx: broadcast::Receiver<MapMessage>,
    state: AppState,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut subs = SubscriptionManager::new();

    for initial in initial_messages(&state).await {
        if ws_tx
            .send(Message::text(WsMessage::event(&initial).to_json()))
            .await
            .is_err()
        {
            return;
        }
    }

    loop {
        tokio::select! {
            // Incoming message from client
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let response = handle_text_message(&text, &mut subs);
                        if ws_tx.send(Message::text(response.to_json())).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
            // Message from EventBus
            event = event_rx.recv() => {
                match event {
                    Ok(map_message) => {
                        if subs.matches(map_message.channel()) {
                            let json = WsMessage::event(&map_message).to_json();
                            if ws_tx.send(Message::text(json)).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "ws client lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!("ws connection closed");
}

/// Current overlay and knock set for a newly connected surface.
async fn initial_messages(state: &AppState) -> [MapMessage; 2] {
    let pipeline = state.pipeline();
    [
        MapMessage::UpdateHailContours {
            contours: (*pipeline.current()).clone(),
            strategy: pipeline
                .last_strategy()
                .unwrap_or(crate::service::contour_pipeline::EMPTY_STRATEGY)
                .to_string(),
            timestamp: Utc::now(),
        },
        MapMessage::UpdateKnocks {
            knocks: state.knock_sync.snapshot().await,
            timestamp: Utc::now(),
        },
    ]
}

/// Handles a text message from the client, returning the reply.
fn handle_text_message(text: &str, subs: &mut SubscriptionManager) -> WsMessage {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return WsMessage::error(String::new(), 400, "malformed JSON");
    };
    if msg.msg_type != WsMessageType::Command {
        return WsMessage::error(msg.id, 400, "expected a command");
    }
    let Ok(command) = serde_json::from_value::<WsCommand>(msg.payload) else {
        return WsMessage::error(msg.id, 404, "unknown command");
    };

    let (action, unknown) = match &command {
        WsCommand::Subscribe { channels } => ("subscribe", subs.subscribe(channels)),
        WsCommand::Unsubscribe { channels } => ("unsubscribe", subs.unsubscribe(channels)),
    };
    tracing::debug!(action, channels = ?subs.channels(), "ws subscription changed");

    WsMessage::response(
        msg.id,
        serde_json::json!({
            "command": action,
            "channels": subs.channels(),
            "unknown": unknown,
        }),
    )
}
