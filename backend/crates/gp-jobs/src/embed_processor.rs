use crate::{
    CircuitBreaker, EmbedJob, EmbeddingBackend, EmbeddingStore, JobError, JobProcessor, Metrics,
    Result as JobErrorResult,
};

use gp_config::EmbeddingConfig;

use std::panic::Location;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use error_location::ErrorLocation;
use log::{debug, error, info, warn};
use tokio_util::sync::CancellationToken;

pub const POOL_NAME: &str = "embedding";

/// Generates a node embedding and stores it, retrying with doubling delays
pub struct EmbedProcessor {
    backend: Arc<dyn EmbeddingBackend>,
    store: Arc<dyn EmbeddingStore>,
    breaker: Arc<CircuitBreaker>,
    max_attempts: u32,
    retry_base: Duration,
    metrics: Metrics,
}

impl EmbedProcessor {
    pub fn new(
        backend: Arc<dyn EmbeddingBackend>,
        store: Arc<dyn EmbeddingStore>,
        breaker: Arc<CircuitBreaker>,
        config: &EmbeddingConfig,
        metrics: Metrics,
    ) -> Self {
        Self {
            backend,
            store,
            breaker,
            max_attempts: config.max_attempts.max(1),
            retry_base: Duration::from_secs(config.retry_base_secs),
            metrics,
        }
    }

    async fn attempt(&self, job: &EmbedJob) -> JobErrorResult<()> {
        let vector = self
            .breaker
            .call(|| self.backend.embed(&job.text))
            .await
            .inspect_err(|e| {
                if matches!(e, crate::BreakerError::Open) {
                    self.metrics.breaker_rejected();
                }
            })
            .map_err(JobError::from)?;

        self.store
            .update_node_embedding(&job.tenant_id, &job.node_id, &vector)
            .await
    }
}

#[async_trait]
impl JobProcessor for EmbedProcessor {
    type Job = EmbedJob;

    fn name(&self) -> &'static str {
        POOL_NAME
    }

    async fn process(&self, job: EmbedJob, cancel: &CancellationToken) -> JobErrorResult<()> {
        let mut attempt = 1;

        loop {
            match self.attempt(&job).await {
                Ok(()) => {
                    debug!(
                        "Embedding stored for node {} (tenant {}) on attempt {}",
                        job.node_id, job.tenant_id, attempt
                    );
                    return Ok(());
                }
                Err(e) => {
                    warn!(
                        "Embedding attempt {}/{} for node {} (tenant {}) failed: {}",
                        attempt, self.max_attempts, job.node_id, job.tenant_id, e
                    );

                    if attempt >= self.max_attempts {
                        error!(
                            "Embedding for node {} (tenant {}) failed after {} attempts, dropping job",
                            job.node_id, job.tenant_id, attempt
                        );
                        return Err(e);
                    }
                }
            }

            let delay = self.retry_base * 2u32.saturating_pow(attempt - 1);
            self.metrics.job_retried(POOL_NAME);

            tokio::select! {
                _ = cancel.cancelled() => {
                    info!(
                        "Embedding for node {} (tenant {}) abandoned during retry wait",
                        job.node_id, job.tenant_id
                    );
                    return Err(JobError::Cancelled {
                        location: ErrorLocation::from(Location::caller()),
                    });
                }
                _ = tokio::time::sleep(delay) => {}
            }

            attempt += 1;
        }
    }
}
