use crate::{JobError, Metrics, Result as JobErrorResult};

use gp_config::{AuditConfig, EmbeddingConfig};

use std::panic::Location;
use std::sync::Arc;

use async_trait::async_trait;
use error_location::ErrorLocation;
use log::{debug, warn};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Work executed by a [`WorkerPool`]
#[async_trait]
pub trait JobProcessor: Send + Sync + 'static {
    type Job: Send + 'static;

    /// Pool name used in logs and metrics
    fn name(&self) -> &'static str;

    /// Handle one job. `cancel` fires when the pool starts shutting down.
    async fn process(&self, job: Self::Job, cancel: &CancellationToken) -> JobErrorResult<()>;
}

#[derive(Debug, Clone, Copy)]
pub struct WorkerPoolConfig {
    pub queue_capacity: usize,
    pub concurrency: usize,
}

impl From<&EmbeddingConfig> for WorkerPoolConfig {
    fn from(config: &EmbeddingConfig) -> Self {
        Self {
            queue_capacity: config.queue_capacity,
            concurrency: config.concurrency,
        }
    }
}

impl From<&AuditConfig> for WorkerPoolConfig {
    fn from(config: &AuditConfig) -> Self {
        Self {
            queue_capacity: config.queue_capacity,
            concurrency: config.concurrency,
        }
    }
}

/// Bounded queue consumed by a fixed set of worker tasks
pub struct WorkerPool<P: JobProcessor> {
    name: &'static str,
    sender: mpsc::Sender<P::Job>,
    cancel: CancellationToken,
    workers: Mutex<Vec<JoinHandle<()>>>,
    metrics: Metrics,
}

impl<P: JobProcessor> WorkerPool<P> {
    /// Spawn the workers. Must be called from within a Tokio runtime.
    pub fn start(processor: P, config: WorkerPoolConfig, metrics: Metrics) -> Self {
        let name = processor.name();
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let receiver = Arc::new(Mutex::new(receiver));
        let processor = Arc::new(processor);
        let cancel = CancellationToken::new();

        let workers = (0..config.concurrency.max(1))
            .map(|worker_id| {
                tokio::spawn(worker_loop(
                    worker_id,
                    Arc::clone(&processor),
                    Arc::clone(&receiver),
                    cancel.clone(),
                    metrics.clone(),
                ))
            })
            .collect();

        debug!(
            "{} pool started with {} worker(s), queue capacity {}",
            name,
            config.concurrency.max(1),
            config.queue_capacity.max(1)
        );

        Self {
            name,
            sender,
            cancel,
            workers: Mutex::new(workers),
            metrics,
        }
    }

    /// Queue a job without waiting. A full queue drops the job.
    #[track_caller]
    pub fn enqueue(&self, job: P::Job) -> JobErrorResult<()> {
        if self.cancel.is_cancelled() {
            return Err(JobError::PoolStopped {
                pool: self.name,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        match self.sender.try_send(job) {
            Ok(()) => {
                self.metrics.job_enqueued(self.name, self.queue_depth());
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                warn!("{} queue full, dropping job", self.name);
                self.metrics.job_dropped(self.name, "queue_full");
                Err(JobError::QueueFull {
                    pool: self.name,
                    location: ErrorLocation::from(Location::caller()),
                })
            }
            Err(TrySendError::Closed(_)) => Err(JobError::PoolStopped {
                pool: self.name,
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    pub fn queue_depth(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Stop accepting jobs, let each worker drain what is queued once, and
    /// wait for all of them to exit.
    pub async fn shutdown(&self) {
        self.cancel.cancel();

        let workers = std::mem::take(&mut *self.workers.lock().await);
        for worker in workers {
            if let Err(e) = worker.await {
                warn!("{} worker ended abnormally: {}", self.name, e);
            }
        }

        debug!("{} pool stopped", self.name);
    }
}

async fn worker_loop<P: JobProcessor>(
    worker_id: usize,
    processor: Arc<P>,
    receiver: Arc<Mutex<mpsc::Receiver<P::Job>>>,
    cancel: CancellationToken,
    metrics: Metrics,
) {
    loop {
        let job = {
            let mut receiver = receiver.lock().await;
            tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                job = receiver.recv() => job,
            }
        };

        let Some(job) = job else {
            break;
        };
        run_job(processor.as_ref(), job, &cancel, &metrics).await;
    }

    // One best-effort pass over whatever is still queued.
    loop {
        let job = receiver.lock().await.try_recv();
        let Ok(job) = job else {
            break;
        };
        run_job(processor.as_ref(), job, &cancel, &metrics).await;
    }

    debug!("{} worker {} stopped", processor.name(), worker_id);
}

async fn run_job<P: JobProcessor>(
    processor: &P,
    job: P::Job,
    cancel: &CancellationToken,
    metrics: &Metrics,
) {
    match processor.process(job, cancel).await {
        Ok(()) => metrics.job_completed(processor.name()),
        Err(e) => {
            debug!("{} job failed: {}", processor.name(), e);
            metrics.job_failed(processor.name());
        }
    }
}
