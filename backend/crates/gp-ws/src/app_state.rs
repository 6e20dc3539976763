use crate::{ConnectionActor, ConnectionConfig, ConnectionHandle, EventHub, Metrics, ShutdownCoordinator};

use gp_auth::CredentialValidator;

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, StatusCode},
    response::Response,
};
use futures::StreamExt;
use log::{debug, warn};
use serde::Deserialize;

/// Shared application state for WebSocket handlers
#[derive(Clone)]
pub struct AppState {
    pub hub: EventHub,
    pub validator: Arc<dyn CredentialValidator>,
    pub metrics: Metrics,
    pub shutdown: ShutdownCoordinator,
    pub config: ConnectionConfig,
}

#[derive(Debug, Deserialize)]
pub struct UpgradeQuery {
    pub api_key: Option<String>,
}

/// WebSocket upgrade handler. The API key is checked before upgrading.
pub async fn handler(
    State(state): State<AppState>,
    Query(query): Query<UpgradeQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Result<Response, StatusCode> {
    if state.shutdown.is_shutdown() {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    let api_key = extract_api_key(&headers, query.api_key)?;

    let tenant_id = state.validator.validate(&api_key).await.map_err(|e| {
        warn!("API key rejected ({}): {}", e.error_code(), e);
        StatusCode::UNAUTHORIZED
    })?;
    debug!("WebSocket upgrade request for tenant {}", tenant_id);

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, api_key, tenant_id)))
}

/// Handle WebSocket connection after upgrade
async fn handle_socket(socket: WebSocket, state: AppState, api_key: String, tenant_id: String) {
    let (handle, outbound_rx) = ConnectionHandle::new(tenant_id, state.config.send_buffer_size);

    if let Err(e) = state.hub.register(handle.clone()) {
        warn!("Connection {} not registered: {}", handle.id, e);
        return;
    }

    let (sink, stream) = socket.split();

    ConnectionActor::new(
        state.hub,
        handle,
        outbound_rx,
        state.validator,
        api_key,
        state.config,
        state.metrics,
    )
    .run(sink, stream)
    .await;
}

/// API key from `Authorization: Bearer`, falling back to the `api_key` query parameter
fn extract_api_key(headers: &HeaderMap, query_key: Option<String>) -> Result<String, StatusCode> {
    let header_key = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string);

    header_key
        .or(query_key.filter(|key| !key.is_empty()))
        .ok_or_else(|| {
            warn!("WebSocket upgrade without API key");
            StatusCode::UNAUTHORIZED
        })
}
