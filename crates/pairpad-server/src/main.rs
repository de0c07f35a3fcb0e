//! pairpad-server: collaborative session relay.
//!
//! Accepts WebSocket connections, fans session updates out to channel
//! members, and serves the session-creation HTTP endpoint. Session state is
//! in-memory only and lives for the process lifetime.

mod channel;
mod connection;
mod coordinator;
mod http;
mod store;

use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;

use crate::channel::ChannelRegistry;
use crate::connection::handle_connection;
use crate::http::{router, HttpState};
use crate::store::SessionStore;

#[derive(Parser)]
#[command(name = "pairpad-server", about = "Real-time collaborative code session relay")]
struct Args {
    /// WebSocket port.
    #[arg(short, long, default_value_t = 4000)]
    port: u16,

    /// HTTP port for session creation and health checks.
    #[arg(long, default_value_t = 4001)]
    http_port: u16,

    /// Client origin used to build share URLs.
    #[arg(long, default_value = "http://localhost:5173")]
    client_origin: String,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pairpad_server=info".into()),
        )
        .init();

    let args = Args::parse();
    let store = SessionStore::new();
    let registry = ChannelRegistry::new();

    // HTTP surface.
    let http_state = HttpState {
        store: store.clone(),
        client_origin: args.client_origin.clone(),
    };
    let http_addr = format!("0.0.0.0:{}", args.http_port);
    let http_listener = TcpListener::bind(&http_addr)
        .await
        .expect("Failed to bind HTTP listener");
    tracing::info!("HTTP API listening on {}", http_addr);
    tokio::spawn(async move {
        if let Err(e) = axum::serve(http_listener, router(http_state)).await {
            tracing::error!(error = %e, "HTTP server exited");
        }
    });

    // Periodic stats tick. Sessions are never reaped; state must survive
    // every disconnect so rejoining clients resynchronize from it.
    let stats_store = store.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(60)).await;
            let count = stats_store.count().await;
            tracing::debug!(sessions = count, "Stats tick");
        }
    });

    // WebSocket accept loop.
    let addr = format!("0.0.0.0:{}", args.port);
    let listener = TcpListener::bind(&addr)
        .await
        .expect("Failed to bind TCP listener");
    tracing::info!("pairpad-server listening on {}", addr);

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let store = store.clone();
                let registry = registry.clone();
                tokio::spawn(async move {
                    match accept_async(stream).await {
                        Ok(ws) => handle_connection(ws, addr, store, registry).await,
                        Err(e) => {
                            tracing::warn!(peer = %addr, error = %e, "WS handshake failed");
                        }
                    }
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "TCP accept error");
            }
        }
    }
}
