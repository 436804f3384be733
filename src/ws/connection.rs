//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single WebSocket connection,
//! dispatching incoming commands and forwarding filtered events.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{WsCommand, WsMessage, WsMessageType, WsRequest};
use super::subscription::SubscriptionManager;
use crate::domain::{GlobalSnapshot, StatsEvent};
use crate::service::TrackingService;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Sends the current snapshot once on connect.
/// - Reads commands from the client and dispatches them.
/// - Forwards matching events from the [`broadcast::Receiver`] to the client.
pub async fn run_connection(
    socket: WebSocket,
    mut event_rx: broadcast::Receiver<StatsEvent>,
    tracking: Arc<TrackingService>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut subs = SubscriptionManager::new();

    let initial = WsMessage::event(snapshot_payload(tracking.snapshot().await));
    let initial = serde_json::to_string(&initial).unwrap_or_default();
    if ws_tx.send(Message::text(initial)).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            // Incoming message from client
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let response = handle_text_message(&text, &mut subs, &tracking).await;
                        if let Some(resp_json) = response
                            && ws_tx.send(Message::text(resp_json)).await.is_err() {
                                break;
                            }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
            // Event from EventBus
            event = event_rx.recv() => {
                match event {
                    Ok(stats_event) => {
                        if subs.matches(stats_event.user_id()) {
                            let msg = WsMessage::event(
                                serde_json::to_value(&stats_event).unwrap_or_default(),
                            );
                            let json = serde_json::to_string(&msg).unwrap_or_default();
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

fn snapshot_payload(stats: GlobalSnapshot) -> serde_json::Value {
    serde_json::json!({ "event_type": "snapshot", "stats": stats })
}

/// Handles a text message from the client, returning an optional JSON response.
async fn handle_text_message(
    text: &str,
    subs: &mut SubscriptionManager,
    tracking: &TrackingService,
) -> Option<String> {
    let request = match serde_json::from_str::<WsRequest>(text) {
        Ok(request) => request,
        Err(e) => {
            let code = if serde_json::from_str::<serde_json::Value>(text).is_ok() {
                404
            } else {
                400
            };
            tracing::debug!(error = %e, code, "rejected ws message");
            let message = if code == 404 { "unknown command" } else { "malformed JSON" };
            return serde_json::to_string(&WsMessage::error("", code, message)).ok();
        }
    };

    let id = request.id;
    let response = match request.command {
        WsCommand::Subscribe { user_ids } => {
            subs.subscribe(&user_ids);
            WsMessage::new(
                id,
                WsMessageType::Response,
                serde_json::json!({
                    "subscribed": user_ids,
                    "count": subs.count(),
                    "wildcard": subs.is_subscribed_all(),
                }),
            )
        }
        WsCommand::Unsubscribe { user_ids } => {
            subs.unsubscribe(&user_ids);
            WsMessage::new(
                id,
                WsMessageType::Response,
                serde_json::json!({
                    "unsubscribed": user_ids,
                    "remaining_count": subs.count(),
                    "wildcard": subs.is_subscribed_all(),
                }),
            )
        }
        WsCommand::GetStats => WsMessage::new(
            id,
            WsMessageType::Response,
            snapshot_payload(tracking.snapshot().await),
        ),
    };
    serde_json::to_string(&response).ok()
}
