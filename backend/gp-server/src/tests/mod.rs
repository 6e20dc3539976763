mod pg_store;

use crate::{JobQueues, PgStore, ServerState};

use gp_auth::JwtValidator;
use gp_config::HubConfig;
use gp_jobs::{AuditProcessor, WorkerPool, WorkerPoolConfig};
use gp_ws::{AppState, ConnectionConfig, EventBuffer, EventHub, Metrics, ShutdownCoordinator};

use std::sync::Arc;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;
use sqlx::postgres::PgPoolOptions;

pub(crate) const TEST_JWT_SECRET: &[u8] = b"test-secret-key-for-server-tests-at-least-32-bytes";

/// State whose database is unreachable: nothing listens on port 1
pub(crate) fn offline_state() -> ServerState {
    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(500))
        .connect_lazy("postgres://gp:gp@127.0.0.1:1/graph")
        .unwrap();

    let buffer = Arc::new(EventBuffer::new(100, Duration::from_secs(3600)));
    let hub = EventHub::start(&HubConfig::default(), buffer, Metrics::default());

    let audit = WorkerPool::start(
        AuditProcessor::new(Arc::new(PgStore::new(pool.clone()))),
        WorkerPoolConfig {
            queue_capacity: 10,
            concurrency: 1,
        },
        gp_jobs::Metrics::default(),
    );

    ServerState {
        ws: AppState {
            hub,
            validator: Arc::new(JwtValidator::with_hs256(TEST_JWT_SECRET)),
            metrics: Metrics::default(),
            shutdown: ShutdownCoordinator::new(),
            config: ConnectionConfig::default(),
        },
        pool,
        jobs: Arc::new(JobQueues::new(None, audit)),
        prometheus: PrometheusBuilder::new().build_recorder().handle(),
    }
}
