//! Configuration and event/command types for the session client.

use pairpad_common::Language;

/// Configuration for connecting to a pairpad server.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// WebSocket URL of the relay (e.g. "ws://localhost:4000").
    pub url: String,
    /// Session to join on every (re)connect.
    pub session_id: String,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Reconnect base delay in seconds.
    pub reconnect_delay_secs: u64,
    /// Maximum reconnect delay in seconds.
    pub max_reconnect_delay_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:4000".to_string(),
            session_id: String::new(),
            connect_timeout_secs: 15,
            reconnect_delay_secs: 1,
            max_reconnect_delay_secs: 30,
        }
    }
}

/// Local mirror of the shared session state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionMirror {
    pub code: String,
    pub language: Language,
}

/// Events surfaced to the application layer.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Transport established; a join is in flight.
    Connected,
    /// Transport lost; the mirror keeps its last-known state.
    Disconnected,
    /// Full snapshot applied after a join.
    StateSync { code: String, language: Language },
    /// Another participant changed the code.
    CodeUpdate { code: String },
    /// Any participant (including us) changed the language.
    LanguageUpdate { language: Language },
}

/// Commands sent to the background connection task.
#[derive(Debug)]
pub(crate) enum ClientCommand {
    SendCode(String),
    SendLanguage(Language),
    Disconnect,
}
