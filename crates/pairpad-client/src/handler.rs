//! Applies incoming server events to the local mirror.

use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use tracing::debug;

use pairpad_common::ServerEvent;

use crate::types::{SessionEvent, SessionMirror};

/// Overwrite the mirror with an incoming event and surface it to the
/// application. No merge, no staleness check: the last message wins.
pub(crate) async fn apply_server_event(
    mirror: &Arc<RwLock<SessionMirror>>,
    event_tx: &mpsc::Sender<SessionEvent>,
    event: ServerEvent,
) {
    match event {
        ServerEvent::State { code, language } => {
            debug!(language = %language, "Snapshot received");
            {
                let mut m = mirror.write().await;
                m.code = code.clone();
                m.language = language.clone();
            }
            let _ = event_tx
                .send(SessionEvent::StateSync { code, language })
                .await;
        }
        ServerEvent::CodeUpdate { code } => {
            mirror.write().await.code = code.clone();
            let _ = event_tx.send(SessionEvent::CodeUpdate { code }).await;
        }
        ServerEvent::LanguageUpdate { language } => {
            debug!(language = %language, "Language update received");
            mirror.write().await.language = language.clone();
            let _ = event_tx
                .send(SessionEvent::LanguageUpdate { language })
                .await;
        }
    }
}
