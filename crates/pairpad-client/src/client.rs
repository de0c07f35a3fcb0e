//! Public handle for a collaborative session.

use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};

use pairpad_common::Language;

use crate::connection::connection_loop;
use crate::types::{ClientCommand, SessionConfig, SessionEvent, SessionMirror};

/// Handle for one joined session.
///
/// All methods are non-blocking: local requests update the mirror
/// immediately (optimistic echo) and are forwarded to the background
/// connection task only while connected. A request made while disconnected
/// still updates the mirror, but the change is not propagated and will be
/// lost unless edited again after reconnect.
pub struct SessionClient {
    command_tx: mpsc::Sender<ClientCommand>,
    mirror: Arc<RwLock<SessionMirror>>,
    connected: Arc<RwLock<bool>>,
}

impl SessionClient {
    /// Connect to a session and start the background transport.
    /// Returns `(client, event_receiver)`.
    pub fn connect(config: SessionConfig) -> (Self, mpsc::Receiver<SessionEvent>) {
        let (event_tx, event_rx) = mpsc::channel(256);
        let (client, command_rx) = Self::detached();
        tokio::spawn(connection_loop(
            config,
            Arc::clone(&client.mirror),
            Arc::clone(&client.connected),
            event_tx,
            command_rx,
        ));
        (client, event_rx)
    }

    /// Build a client without a transport task. The caller owns the command
    /// receiver; used for tests of the request semantics.
    fn detached() -> (Self, mpsc::Receiver<ClientCommand>) {
        let (command_tx, command_rx) = mpsc::channel(64);
        let client = Self {
            command_tx,
            mirror: Arc::new(RwLock::new(SessionMirror::default())),
            connected: Arc::new(RwLock::new(false)),
        };
        (client, command_rx)
    }

    /// Replace the local code and propagate the change if connected.
    pub async fn request_code_change(&self, code: impl Into<String>) {
        let code = code.into();
        self.mirror.write().await.code = code.clone();
        if *self.connected.read().await {
            let _ = self.command_tx.send(ClientCommand::SendCode(code)).await;
        }
    }

    /// Replace the local language and propagate the change if connected.
    pub async fn request_language_change(&self, language: Language) {
        self.mirror.write().await.language = language.clone();
        if *self.connected.read().await {
            let _ = self
                .command_tx
                .send(ClientCommand::SendLanguage(language))
                .await;
        }
    }

    /// Current mirrored code.
    pub async fn code(&self) -> String {
        self.mirror.read().await.code.clone()
    }

    /// Current mirrored language.
    pub async fn language(&self) -> Language {
        self.mirror.read().await.language.clone()
    }

    /// Full mirrored state, e.g. as input for the execution dispatcher.
    pub async fn snapshot(&self) -> SessionMirror {
        self.mirror.read().await.clone()
    }

    /// Check if the transport is up.
    pub async fn is_connected(&self) -> bool {
        *self.connected.read().await
    }

    /// Close the connection and stop the background task.
    pub async fn disconnect(&self) {
        let _ = self.command_tx.send(ClientCommand::Disconnect).await;
    }
}
