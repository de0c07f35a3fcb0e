//! Sync-channel wire protocol: JSON text frames tagged with `"type"`.
//!
//! Frames that fail to parse are dropped by the receiver; delivery is
//! at-most-once with no acknowledgment in either direction.

use serde::{Deserialize, Serialize};

use crate::language::Language;

/// Messages a participant sends to the coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Join (and lazily create) a session channel.
    #[serde(rename = "session:join")]
    Join { session_id: String },

    /// Replace the session's code document.
    #[serde(rename = "code:change")]
    CodeChange { session_id: String, code: String },

    /// Replace the session's language selection.
    #[serde(rename = "language:change")]
    LanguageChange {
        session_id: String,
        language: Language,
    },
}

/// Messages the coordinator sends to participants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Full snapshot, sent once right after a successful join.
    #[serde(rename = "session:state")]
    State { code: String, language: Language },

    /// Code changed by another member of the channel.
    #[serde(rename = "code:update")]
    CodeUpdate { code: String },

    /// Language changed by any member, echoed to everyone.
    #[serde(rename = "language:update")]
    LanguageUpdate { language: Language },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_wire_format() {
        let ev: ClientEvent =
            serde_json::from_str(r#"{"type":"session:join","session_id":"abc"}"#).unwrap();
        assert!(matches!(ev, ClientEvent::Join { ref session_id } if session_id == "abc"));
    }

    #[test]
    fn code_change_requires_string_payload() {
        // A numeric code payload is malformed and must fail to parse,
        // which the coordinator treats as a silent drop.
        let err = serde_json::from_str::<ClientEvent>(
            r#"{"type":"code:change","session_id":"abc","code":42}"#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn language_change_carries_unknown_values() {
        let ev: ClientEvent = serde_json::from_str(
            r#"{"type":"language:change","session_id":"abc","language":"ruby"}"#,
        )
        .unwrap();
        match ev {
            ClientEvent::LanguageChange { language, .. } => {
                assert_eq!(language, Language::Other("ruby".into()));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn state_snapshot_wire_format() {
        let ev = ServerEvent::State {
            code: String::new(),
            language: Language::Javascript,
        };
        assert_eq!(
            serde_json::to_string(&ev).unwrap(),
            r#"{"type":"session:state","code":"","language":"javascript"}"#
        );
    }

    #[test]
    fn update_events_round_trip() {
        let ev = ServerEvent::CodeUpdate {
            code: "print(1)".into(),
        };
        let json = serde_json::to_string(&ev).unwrap();
        let back: ServerEvent = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, ServerEvent::CodeUpdate { ref code } if code == "print(1)"));

        let ev = ServerEvent::LanguageUpdate {
            language: Language::Python,
        };
        assert_eq!(
            serde_json::to_string(&ev).unwrap(),
            r#"{"type":"language:update","language":"python"}"#
        );
    }
}
