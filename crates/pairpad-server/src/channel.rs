//! Channel membership and broadcast fan-out.
//!
//! One channel per session id, holding the outbound sender of every live
//! connection that joined it. Fan-out uses `try_send`: a member whose queue
//! is full or closed simply misses the frame (at-most-once delivery).

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};

use pairpad_common::ServerEvent;

/// Identifies one live connection.
pub type MemberId = u64;

static MEMBER_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Allocate an id for a newly accepted connection.
pub fn next_member_id() -> MemberId {
    MEMBER_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Membership registry for all session channels.
#[derive(Clone)]
pub struct ChannelRegistry {
    channels: Arc<RwLock<HashMap<String, HashMap<MemberId, mpsc::Sender<ServerEvent>>>>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Add a member to a session's channel. Joining a second session does
    /// not remove the member from the first; only `leave_all` does.
    pub async fn join(&self, session_id: &str, member: MemberId, tx: mpsc::Sender<ServerEvent>) {
        let mut map = self.channels.write().await;
        map.entry(session_id.to_string())
            .or_default()
            .insert(member, tx);
    }

    /// Remove a member from one channel. The channel itself is kept even
    /// when empty; session state outlives its members.
    pub async fn leave(&self, session_id: &str, member: MemberId) {
        let mut map = self.channels.write().await;
        if let Some(members) = map.get_mut(session_id) {
            members.remove(&member);
        }
    }

    /// Remove a member from every channel it joined (transport disconnect).
    pub async fn leave_all(&self, member: MemberId) {
        let mut map = self.channels.write().await;
        for members in map.values_mut() {
            members.remove(&member);
        }
    }

    /// Send an event to every member of the channel.
    pub async fn broadcast_all(&self, session_id: &str, event: &ServerEvent) {
        self.fan_out(session_id, None, event).await;
    }

    /// Send an event to every member except `origin`.
    pub async fn broadcast_except(
        &self,
        session_id: &str,
        origin: MemberId,
        event: &ServerEvent,
    ) {
        self.fan_out(session_id, Some(origin), event).await;
    }

    async fn fan_out(&self, session_id: &str, skip: Option<MemberId>, event: &ServerEvent) {
        let map = self.channels.read().await;
        let Some(members) = map.get(session_id) else {
            return;
        };
        for (member, tx) in members {
            if Some(*member) == skip {
                continue;
            }
            if tx.try_send(event.clone()).is_err() {
                tracing::debug!(session = %session_id, member, "Dropping frame for slow or closed member");
            }
        }
    }

    /// Number of members currently in a channel.
    pub async fn member_count(&self, session_id: &str) -> usize {
        self.channels
            .read()
            .await
            .get(session_id)
            .map(|m| m.len())
            .unwrap_or(0)
    }
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pairpad_common::Language;

    fn member() -> (MemberId, mpsc::Sender<ServerEvent>, mpsc::Receiver<ServerEvent>) {
        let (tx, rx) = mpsc::channel(8);
        (next_member_id(), tx, rx)
    }

    #[tokio::test]
    async fn broadcast_except_skips_the_origin() {
        let registry = ChannelRegistry::new();
        let (a, a_tx, mut a_rx) = member();
        let (b, b_tx, mut b_rx) = member();
        registry.join("s1", a, a_tx).await;
        registry.join("s1", b, b_tx).await;

        let event = ServerEvent::CodeUpdate { code: "x".into() };
        registry.broadcast_except("s1", a, &event).await;

        assert!(b_rx.try_recv().is_ok());
        assert!(a_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn broadcast_all_includes_every_member() {
        let registry = ChannelRegistry::new();
        let (a, a_tx, mut a_rx) = member();
        let (b, b_tx, mut b_rx) = member();
        registry.join("s1", a, a_tx).await;
        registry.join("s1", b, b_tx).await;

        let event = ServerEvent::LanguageUpdate {
            language: Language::Python,
        };
        registry.broadcast_all("s1", &event).await;

        assert!(a_rx.try_recv().is_ok());
        assert!(b_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn leave_all_removes_member_from_every_channel() {
        let registry = ChannelRegistry::new();
        let (a, a_tx, _a_rx) = member();
        registry.join("s1", a, a_tx.clone()).await;
        registry.join("s2", a, a_tx).await;
        assert_eq!(registry.member_count("s1").await, 1);
        assert_eq!(registry.member_count("s2").await, 1);

        registry.leave_all(a).await;
        assert_eq!(registry.member_count("s1").await, 0);
        assert_eq!(registry.member_count("s2").await, 0);
    }

    #[tokio::test]
    async fn joining_a_second_session_keeps_the_first() {
        let registry = ChannelRegistry::new();
        let (a, a_tx, mut a_rx) = member();
        registry.join("s1", a, a_tx.clone()).await;
        registry.join("s2", a, a_tx).await;

        // Still reachable through the first channel.
        let event = ServerEvent::CodeUpdate { code: "y".into() };
        registry.broadcast_all("s1", &event).await;
        assert!(a_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn full_queue_drops_the_frame() {
        let registry = ChannelRegistry::new();
        let (tx, mut rx) = mpsc::channel(1);
        let a = next_member_id();
        registry.join("s1", a, tx).await;

        let event = ServerEvent::CodeUpdate { code: "x".into() };
        registry.broadcast_all("s1", &event).await;
        registry.broadcast_all("s1", &event).await; // queue full, dropped

        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }
}
