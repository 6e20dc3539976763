use gp_server::{JobQueues, PgStore, ServerError, ServerState, build_router, logger};

use gp_auth::JwtValidator;
use gp_feed::{ChangeFeedBridge, PgNotificationSource};
use gp_jobs::{
    AuditProcessor, CircuitBreaker, EmbedProcessor, HttpEmbeddingBackend, WorkerPool,
    WorkerPoolConfig,
};
use gp_ws::{AppState, ConnectionConfig, EventBuffer, EventHub, ShutdownCoordinator};

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};
use metrics_exporter_prometheus::PrometheusBuilder;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Load and validate configuration
    let config = gp_config::Config::load()?;
    config.validate()?;

    let log_file_path = if let Some(ref filename) = config.logging.file {
        let log_dir = gp_config::Config::config_dir()?.join(&config.logging.dir);
        std::fs::create_dir_all(&log_dir)?;
        Some(log_dir.join(filename))
    } else {
        None
    };

    // Initialize logger (before any other logging)
    logger::initialize(config.logging.level, log_file_path, config.logging.colored)?;

    info!("Starting gp-server v{}", env!("CARGO_PKG_VERSION"));
    config.log_summary();

    let prometheus = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ServerError::Metrics {
            message: e.to_string(),
        })?;

    info!("Connecting to database: {}", config.database.redacted_url());
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await
        .map_err(ServerError::from)?;
    info!("Database connection established");

    let shutdown = ShutdownCoordinator::new();

    // Event hub and replay buffer
    let ws_metrics = gp_ws::Metrics::new();
    let buffer = Arc::new(EventBuffer::from_config(&config.buffer));
    let sweeper = buffer.spawn_sweeper(
        Duration::from_secs(config.buffer.sweep_interval_secs),
        shutdown.child_token(),
    );
    let hub = EventHub::start(&config.hub, buffer, ws_metrics.clone());

    // Background jobs
    let job_metrics = gp_jobs::Metrics::new();
    let store = Arc::new(PgStore::new(pool.clone()));

    let embedding = if config.embedding.enabled {
        let backend = Arc::new(HttpEmbeddingBackend::from_config(&config.embedding)?);
        let breaker = Arc::new(CircuitBreaker::from_config(&config.circuit_breaker));
        let processor = EmbedProcessor::new(
            backend,
            store.clone(),
            breaker,
            &config.embedding,
            job_metrics.clone(),
        );
        Some(WorkerPool::start(
            processor,
            WorkerPoolConfig::from(&config.embedding),
            job_metrics.clone(),
        ))
    } else {
        warn!("Embedding generation DISABLED");
        None
    };

    let audit = WorkerPool::start(
        AuditProcessor::new(store),
        WorkerPoolConfig::from(&config.audit),
        job_metrics,
    );
    let jobs = Arc::new(JobQueues::new(embedding, audit));

    // Change feed (the only fatal startup dependency)
    let bridge = ChangeFeedBridge::start(
        Arc::new(PgNotificationSource::new(pool.clone())),
        Arc::new(hub.clone()),
        &config.change_feed,
        gp_feed::Metrics::new(),
        shutdown.child_token(),
    )
    .await?;

    // `validate()` guarantees the secret is present
    let secret = config.auth.jwt_secret.clone().unwrap_or_default();
    let validator = Arc::new(JwtValidator::with_hs256(secret.as_bytes()));

    let state = ServerState {
        ws: AppState {
            hub: hub.clone(),
            validator,
            metrics: ws_metrics,
            shutdown: shutdown.clone(),
            config: ConnectionConfig::from(&config.websocket),
        },
        pool: pool.clone(),
        jobs: Arc::clone(&jobs),
        prometheus,
    };

    let app = build_router(state);

    let listener = TcpListener::bind(config.bind_addr()).await?;
    info!("Server listening on {}", listener.local_addr()?);

    // Spawn signal handler for graceful shutdown
    let shutdown_for_signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
                shutdown_for_signal.shutdown();
            }
            Err(e) => {
                error!("Failed to listen for SIGINT: {}", e);
            }
        }
    });

    // Stop the feed, then drain connections, before the listener is released
    let hub_for_shutdown = hub.clone();
    let shutdown_for_serve = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_for_serve.wait().await;
            bridge.join().await;
            hub_for_shutdown.shutdown().await;
        })
        .await?;

    jobs.shutdown().await;

    if let Err(e) = sweeper.await {
        warn!("Buffer sweeper ended abnormally: {}", e);
    }

    pool.close().await;
    info!("Graceful shutdown complete");

    Ok(())
}
