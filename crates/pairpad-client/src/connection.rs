//! Background WebSocket connection loop with auto-reconnect.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, error, info, warn};

use pairpad_common::{ClientEvent, ServerEvent};

use crate::handler::apply_server_event;
use crate::types::{ClientCommand, SessionConfig, SessionEvent, SessionMirror};

/// Background task managing the WebSocket connection.
///
/// Every successful (re)connect sends a fresh `session:join`, so the server
/// replies with a snapshot and the mirror resynchronizes.
pub(crate) async fn connection_loop(
    config: SessionConfig,
    mirror: Arc<RwLock<SessionMirror>>,
    connected: Arc<RwLock<bool>>,
    event_tx: mpsc::Sender<SessionEvent>,
    command_rx: mpsc::Receiver<ClientCommand>,
) {
    let command_rx = Arc::new(Mutex::new(command_rx));
    let shutdown = Arc::new(AtomicBool::new(false));
    let mut reconnect_delay = config.reconnect_delay_secs;

    loop {
        info!(url = %config.url, session = %config.session_id, "Connecting to pairpad server");

        match tokio::time::timeout(
            Duration::from_secs(config.connect_timeout_secs),
            tokio_tungstenite::connect_async(&config.url),
        )
        .await
        {
            Ok(Ok((ws_stream, _))) => {
                reconnect_delay = config.reconnect_delay_secs;
                *connected.write().await = true;
                let _ = event_tx.send(SessionEvent::Connected).await;

                let (ws_write, mut ws_read) = ws_stream.split();
                let ws_write = Arc::new(Mutex::new(ws_write));

                // Join (or re-join) the session; the snapshot comes back as
                // a session:state frame.
                send_event(
                    &ws_write,
                    &ClientEvent::Join {
                        session_id: config.session_id.clone(),
                    },
                )
                .await;

                // Spawn command forwarder.
                let cmd_handle = tokio::spawn(command_forwarder(
                    Arc::clone(&command_rx),
                    Arc::clone(&ws_write),
                    config.session_id.clone(),
                    Arc::clone(&shutdown),
                ));

                // Process incoming frames.
                while let Some(frame) = ws_read.next().await {
                    match frame {
                        Ok(WsMessage::Text(text)) => {
                            match serde_json::from_str::<ServerEvent>(&text) {
                                Ok(event) => {
                                    apply_server_event(&mirror, &event_tx, event).await;
                                }
                                Err(_) => {
                                    debug!(text = %text, "Unrecognized frame from server");
                                }
                            }
                        }
                        Ok(WsMessage::Close(_)) => {
                            info!("Server closed connection");
                            break;
                        }
                        Err(e) => {
                            warn!(error = %e, "WebSocket error");
                            break;
                        }
                        _ => {}
                    }
                }

                cmd_handle.abort();
                *connected.write().await = false;
                let _ = event_tx.send(SessionEvent::Disconnected).await;

                if shutdown.load(Ordering::SeqCst) {
                    return;
                }
            }
            Ok(Err(e)) => {
                error!(error = %e, "Failed to connect");
            }
            Err(_elapsed) => {
                error!(
                    timeout = config.connect_timeout_secs,
                    "WebSocket connection timed out"
                );
            }
        }

        // Exponential backoff reconnect.
        info!(delay = reconnect_delay, "Reconnecting in {} seconds", reconnect_delay);
        tokio::time::sleep(Duration::from_secs(reconnect_delay)).await;
        reconnect_delay = (reconnect_delay * 2).min(config.max_reconnect_delay_secs);
    }
}

/// Serialize a client event and send it as a text frame.
async fn send_event<S>(ws_write: &Arc<Mutex<S>>, event: &ClientEvent)
where
    S: futures_util::Sink<WsMessage> + Unpin,
{
    if let Ok(json) = serde_json::to_string(event) {
        let mut writer = ws_write.lock().await;
        let _ = writer.send(WsMessage::Text(json.into())).await;
    }
}

/// Forward application commands to the socket as protocol frames.
async fn command_forwarder<S>(
    cmd_rx: Arc<Mutex<mpsc::Receiver<ClientCommand>>>,
    ws_write: Arc<Mutex<S>>,
    session_id: String,
    shutdown: Arc<AtomicBool>,
) where
    S: futures_util::Sink<WsMessage> + Unpin,
{
    let mut rx = cmd_rx.lock().await;
    while let Some(cmd) = rx.recv().await {
        match cmd {
            ClientCommand::SendCode(code) => {
                send_event(
                    &ws_write,
                    &ClientEvent::CodeChange {
                        session_id: session_id.clone(),
                        code,
                    },
                )
                .await;
            }
            ClientCommand::SendLanguage(language) => {
                send_event(
                    &ws_write,
                    &ClientEvent::LanguageChange {
                        session_id: session_id.clone(),
                        language,
                    },
                )
                .await;
            }
            ClientCommand::Disconnect => {
                shutdown.store(true, Ordering::SeqCst);
                let mut writer = ws_write.lock().await;
                let _ = writer.send(WsMessage::Close(None)).await;
                return;
            }
        }
    }
}
