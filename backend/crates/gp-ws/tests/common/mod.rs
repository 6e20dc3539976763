#![allow(dead_code)]

use gp_auth::{Claims, JwtValidator};
use gp_config::HubConfig;
use gp_ws::{AppState, ConnectionConfig, EventBuffer, EventHub, Metrics, ShutdownCoordinator};

use std::sync::Arc;
use std::time::Duration;

use axum::{Router, routing::get};
use axum_test::TestServer;
use jsonwebtoken::{EncodingKey, Header, encode};

/// HS256 requires at least 32 bytes
pub const TEST_JWT_SECRET: &[u8] = b"test-secret-key-for-integration-tests-min-32-bytes-long";

/// Test server with access to AppState for testing
pub struct TestServerWithState {
    pub server: TestServer,
    pub app_state: AppState,
}

pub fn create_test_server() -> TestServerWithState {
    let buffer = Arc::new(EventBuffer::new(100, Duration::from_secs(3600)));
    let hub = EventHub::start(&HubConfig::default(), buffer, Metrics::default());

    let app_state = AppState {
        hub,
        validator: Arc::new(JwtValidator::with_hs256(TEST_JWT_SECRET)),
        metrics: Metrics::default(),
        shutdown: ShutdownCoordinator::new(),
        config: ConnectionConfig::default(),
    };

    let router = Router::new()
        .route("/ws", get(gp_ws::handler))
        .with_state(app_state.clone());

    let server = TestServer::builder()
        .http_transport()
        .build(router)
        .expect("Failed to create test server");

    TestServerWithState { server, app_state }
}

pub fn create_api_key(tenant_id: &str) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: format!("key-{}", tenant_id),
        tenant_id: tenant_id.to_string(),
        exp: now + 3600,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET),
    )
    .expect("Failed to encode API key")
}

/// Registration happens after the upgrade completes, so poll for it
pub async fn wait_for_clients(hub: &EventHub, expected: usize) {
    for _ in 0..100 {
        if hub.client_count() == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!(
        "expected {} connected clients, found {}",
        expected,
        hub.client_count()
    );
}
