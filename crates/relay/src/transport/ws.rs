// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistent WebSocket connections.
//!
//! Each connection owns the strong end of its outbound queue; the registry
//! only sees a weak handle. The connection task is the sole writer to the
//! socket: relay frames arrive through the queue, acks and pings are written
//! directly.

use std::sync::Arc;

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::binding::{BindingError, BindingSession, SessionPhase};
use crate::registry::{ConnectionHandle, ConnectionId, ConnectionRegistry, Frame};
use crate::state::RelayState;

/// Close code sent when a client stops answering pings ("going away").
const CLOSE_PONG_TIMEOUT: u16 = 1001;

/// `GET /ws` — WebSocket upgrade for a relay client.
pub async fn ws_handler(
    State(state): State<Arc<RelayState>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let registry = match state.registry() {
        Ok(r) => Arc::clone(r),
        Err(code) => return code.into_response(),
    };

    ws.on_upgrade(move |socket| handle_connection(state, registry, socket)).into_response()
}

/// Per-connection event loop.
async fn handle_connection(
    state: Arc<RelayState>,
    registry: Arc<ConnectionRegistry>,
    socket: WebSocket,
) {
    let id = ConnectionId::new();
    let (tx, mut rx) = mpsc::channel::<Frame>(state.config.send_buffer);
    let mut session = BindingSession::new(registry, ConnectionHandle::new(id, &tx));
    tracing::info!(conn = %id, "connection established");

    let (mut ws_tx, mut ws_rx) = socket.split();

    let ping_interval = state.config.ping_interval();
    let pong_timeout = state.config.pong_timeout();
    let mut ping = tokio::time::interval_at(Instant::now() + ping_interval, ping_interval);
    let mut pong_deadline: Option<Instant> = None;

    loop {
        tokio::select! {
            _ = state.shutdown.cancelled() => break,

            // Relay frames queued by broadcasts.
            frame = rx.recv() => {
                let Some(frame) = frame else { break };
                if ws_tx.send(Message::Text(String::from(&*frame).into())).await.is_err() {
                    break;
                }
            }

            _ = ping.tick() => {
                if pong_deadline.is_none() {
                    pong_deadline = Some(Instant::now() + pong_timeout);
                }
                if ws_tx.send(Message::Ping(Bytes::new())).await.is_err() {
                    break;
                }
            }

            _ = wait_for(pong_deadline) => {
                tracing::warn!(conn = %id, "pong timeout, closing connection");
                let close = CloseFrame { code: CLOSE_PONG_TIMEOUT, reason: "pong timeout".into() };
                let _ = ws_tx.send(Message::Close(Some(close))).await;
                break;
            }

            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match session.handle_text(text.as_str()) {
                            Ok(Some(reply)) => {
                                if ws_tx.send(Message::Text(String::from(&*reply).into())).await.is_err() {
                                    break;
                                }
                            }
                            Ok(None) => {}
                            Err(BindingError::UnknownEvent(event)) => {
                                tracing::debug!(conn = %id, event = %event, "ignoring unknown event");
                            }
                            Err(e) => {
                                tracing::warn!(conn = %id, err = %e, "ignoring inbound message");
                            }
                        }
                    }
                    Some(Ok(Message::Pong(_))) => pong_deadline = None,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(conn = %id, err = %e, "websocket receive error");
                        break;
                    }
                    // Binary frames are not part of the protocol; pings are
                    // answered by the websocket layer.
                    _ => {}
                }
            }
        }
    }

    let room = match session.phase() {
        SessionPhase::Bound { room } => room.clone(),
        _ => String::new(),
    };
    session.close();
    drop(tx);
    tracing::info!(conn = %id, room = %room, "connection closed");
}

/// Resolve at `deadline`, or never when there is none.
async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
