//! HTTP server and routing.

use std::sync::Arc;

use axum::{
    extract::{ws::WebSocketUpgrade, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower_http::trace::TraceLayer;
use tracing::debug;

use tradereplay_coordinator::CoordinatorHandle;
use tradereplay_protocols::{Request, ResponseBody, Sender};

use crate::connection::handle_socket;
use crate::BridgeState;

#[derive(Clone)]
struct AppState {
    bridge: Arc<BridgeState>,
    coordinator: CoordinatorHandle,
}

/// Create the Axum router for the bridge.
pub fn create_router(bridge: Arc<BridgeState>, coordinator: CoordinatorHandle) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { bridge, coordinator })
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    debug!("WebSocket upgrade request");
    ws.on_upgrade(move |socket| handle_socket(socket, state.bridge, state.coordinator))
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let coordinator = match state
        .coordinator
        .request(Request::DiagnosticPing, Sender::popup())
        .await
        .map(|r| r.into_result())
    {
        Ok(Ok(ResponseBody::Diagnostics(diag))) => serde_json::to_value(diag).unwrap_or_default(),
        Ok(Ok(_)) => serde_json::Value::Null,
        Ok(Err(e)) | Err(e) => serde_json::json!({ "error": e.to_string() }),
    };

    Json(serde_json::json!({
        "status": "ok",
        "connections": state.bridge.connections.len(),
        "tabs": state.bridge.tab_ids(),
        "badge": state.bridge.badge.lock().clone(),
        "coordinator": coordinator,
    }))
}
