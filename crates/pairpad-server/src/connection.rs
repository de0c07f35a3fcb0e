//! Per-connection handler: one task per accepted WebSocket.
//!
//! Unlike a hello-based pairing protocol, every frame here is an in-band
//! [`ClientEvent`]; a connection may join any number of session channels
//! over its lifetime and stays in all of them until it drops.

use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use pairpad_common::{ClientEvent, ServerEvent};

use crate::channel::{next_member_id, ChannelRegistry};
use crate::coordinator::handle_event;
use crate::store::SessionStore;

/// Handle a single WebSocket connection until it closes.
pub async fn handle_connection(
    ws: tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>,
    addr: SocketAddr,
    store: SessionStore,
    registry: ChannelRegistry,
) {
    let (mut sink, mut stream) = ws.split();
    let member = next_member_id();
    let (tx, mut rx) = mpsc::channel::<ServerEvent>(256);

    tracing::info!(peer = %addr, member, "Client connected");

    loop {
        tokio::select! {
            // Outbound queue → this client's socket.
            Some(event) = rx.recv() => {
                let json = match serde_json::to_string(&event) {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::warn!(member, error = %e, "Failed to encode event");
                        continue;
                    }
                };
                if sink.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }

            // Frames from this client's socket → coordinator.
            frame = stream.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientEvent>(&text) {
                            Ok(event) => {
                                handle_event(&store, &registry, member, &tx, event).await;
                            }
                            Err(e) => {
                                // Malformed frames are dropped, never answered.
                                tracing::debug!(member, error = %e, "Dropping unparseable frame");
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(peer = %addr, error = %e, "WS error");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    tracing::info!(peer = %addr, member, "Client disconnected");

    // Membership only; session state is retained for future joins.
    registry.leave_all(member).await;
}
