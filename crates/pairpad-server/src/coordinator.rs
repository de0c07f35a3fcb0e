//! Session coordinator: wires client events to store mutations and
//! channel broadcasts.
//!
//! Validation failures and updates for unknown sessions are dropped without
//! any reply; the protocol has no acks and no error frames for these.

use tokio::sync::mpsc;
use tracing::debug;

use pairpad_common::{ClientEvent, ServerEvent};

use crate::channel::{ChannelRegistry, MemberId};
use crate::store::SessionStore;

/// Handle one client event from `member`.
///
/// `tx` is the member's own outbound queue, used for the join snapshot.
pub async fn handle_event(
    store: &SessionStore,
    registry: &ChannelRegistry,
    member: MemberId,
    tx: &mpsc::Sender<ServerEvent>,
    event: ClientEvent,
) {
    match event {
        ClientEvent::Join { session_id } => {
            if session_id.is_empty() {
                debug!(member, "Dropping join with empty session id");
                return;
            }

            registry.join(&session_id, member, tx.clone()).await;
            let state = store.get_or_create(&session_id).await;
            debug!(session = %session_id, member, "Member joined");

            let snapshot = ServerEvent::State {
                code: state.code,
                language: state.language,
            };
            if tx.send(snapshot).await.is_err() {
                debug!(session = %session_id, member, "Member gone before snapshot");
            }
        }

        ClientEvent::CodeChange { session_id, code } => {
            if session_id.is_empty() {
                debug!(member, "Dropping code change with empty session id");
                return;
            }
            if !store.apply_code_change(&session_id, code.clone()).await {
                debug!(session = %session_id, "Dropping code change for unknown session");
                return;
            }
            // The originator already holds the latest text; echoing it back
            // would fight the local cursor.
            registry
                .broadcast_except(&session_id, member, &ServerEvent::CodeUpdate { code })
                .await;
        }

        ClientEvent::LanguageChange {
            session_id,
            language,
        } => {
            if session_id.is_empty() || language.is_empty() {
                debug!(member, "Dropping malformed language change");
                return;
            }
            if !store
                .apply_language_change(&session_id, language.clone())
                .await
            {
                debug!(session = %session_id, "Dropping language change for unknown session");
                return;
            }
            // Everyone, including the originator, sees the selection confirmed.
            registry
                .broadcast_all(&session_id, &ServerEvent::LanguageUpdate { language })
                .await;
        }
    }
}
