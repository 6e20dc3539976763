use crate::JobQueues;

use gp_ws::AppState;

use std::sync::Arc;

use axum::extract::FromRef;
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;

/// Router state. The WebSocket handler extracts its own [`AppState`] from it.
#[derive(Clone)]
pub struct ServerState {
    pub ws: AppState,
    pub pool: PgPool,
    pub jobs: Arc<JobQueues>,
    pub prometheus: PrometheusHandle,
}

impl FromRef<ServerState> for AppState {
    fn from_ref(state: &ServerState) -> Self {
        state.ws.clone()
    }
}
