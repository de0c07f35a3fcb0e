//! Client-side session adapter.
//!
//! Maintains a local mirror of the shared session state, applies remote
//! broadcasts and local edits to it (last message wins), and forwards local
//! intent upstream while connected. The transport runs on a background task
//! with auto-reconnect; every (re)connect re-joins the session so state
//! resynchronizes through a fresh snapshot.

mod client;
mod connection;
mod handler;
mod types;

pub use client::SessionClient;
pub use types::{SessionConfig, SessionEvent, SessionMirror};
