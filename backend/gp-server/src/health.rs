use crate::ServerState;

use std::time::Duration;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use log::debug;
use serde_json::json;
use sqlx::PgPool;

const DATABASE_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

async fn database_reachable(pool: &PgPool) -> bool {
    match tokio::time::timeout(
        DATABASE_PROBE_TIMEOUT,
        sqlx::query("SELECT 1").execute(pool),
    )
    .await
    {
        Ok(Ok(_)) => true,
        Ok(Err(e)) => {
            debug!("Database probe failed: {}", e);
            false
        }
        Err(_) => {
            debug!("Database probe timed out");
            false
        }
    }
}

/// GET /health - component status and live counters
pub async fn health(State(state): State<ServerState>) -> Response {
    let database = database_reachable(&state.pool).await;
    let stats = state.ws.hub.stats().await;

    let health = json!({
        "status": if database { "healthy" } else { "degraded" },
        "version": env!("CARGO_PKG_VERSION"),
        "shutting_down": state.ws.shutdown.is_shutdown(),
        "connections": {
            "total": stats.total,
            "tenants": stats.per_tenant.len(),
        },
        "database": if database { "ok" } else { "unavailable" },
        "queues": {
            "embedding": state.jobs.embedding_depth(),
            "audit": state.jobs.audit_depth(),
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (StatusCode::OK, Json(health)).into_response()
}

/// GET /live - liveness probe
pub async fn liveness() -> Response {
    (StatusCode::OK, "OK").into_response()
}

/// GET /ready - readiness probe
pub async fn readiness(State(state): State<ServerState>) -> Response {
    if state.ws.shutdown.is_shutdown() {
        return (StatusCode::SERVICE_UNAVAILABLE, "Shutting down").into_response();
    }

    if !database_reachable(&state.pool).await {
        return (StatusCode::SERVICE_UNAVAILABLE, "Database unavailable").into_response();
    }

    (StatusCode::OK, "Ready").into_response()
}

/// GET /metrics - Prometheus text exposition
pub async fn metrics(State(state): State<ServerState>) -> Response {
    (StatusCode::OK, state.prometheus.render()).into_response()
}
