//! Session-creation HTTP surface: `POST /api/session` and `GET /health`.

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tracing::info;

use pairpad_common::new_session_id;

use crate::store::SessionStore;

#[derive(Clone)]
pub struct HttpState {
    pub store: SessionStore,
    pub client_origin: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCreated {
    pub session_id: String,
    pub share_url: String,
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
}

/// Build the HTTP router.
pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/session", post(create_session))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn create_session(State(state): State<HttpState>) -> (StatusCode, Json<SessionCreated>) {
    let session_id = new_session_id();
    state.store.create(&session_id).await;
    info!(session = %session_id, "Session created");

    let share_url = format!("{}/session/{}", state.client_origin, session_id);
    (
        StatusCode::CREATED,
        Json(SessionCreated {
            session_id,
            share_url,
        }),
    )
}
