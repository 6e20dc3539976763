use crate::{JobError, JobProcessor, Metrics, WorkerPool, WorkerPoolConfig};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

struct Recorder {
    seen: Arc<Mutex<Vec<u32>>>,
    cancelled_seen: Arc<AtomicUsize>,
}

#[async_trait]
impl JobProcessor for Recorder {
    type Job = u32;

    fn name(&self) -> &'static str {
        "recorder"
    }

    async fn process(&self, job: u32, cancel: &CancellationToken) -> crate::Result<()> {
        if cancel.is_cancelled() {
            self.cancelled_seen.fetch_add(1, Ordering::SeqCst);
        }
        self.seen.lock().unwrap().push(job);
        Ok(())
    }
}

fn recorder() -> (Recorder, Arc<Mutex<Vec<u32>>>, Arc<AtomicUsize>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let cancelled_seen = Arc::new(AtomicUsize::new(0));
    (
        Recorder {
            seen: Arc::clone(&seen),
            cancelled_seen: Arc::clone(&cancelled_seen),
        },
        seen,
        cancelled_seen,
    )
}

fn config(queue_capacity: usize, concurrency: usize) -> WorkerPoolConfig {
    WorkerPoolConfig {
        queue_capacity,
        concurrency,
    }
}

#[tokio::test]
async fn given_running_pool_when_jobs_enqueued_then_all_processed() {
    let (processor, seen, _) = recorder();
    let pool = WorkerPool::start(processor, config(10, 2), Metrics::default());

    for job in 0..5 {
        pool.enqueue(job).unwrap();
    }
    tokio::task::yield_now().await;
    pool.shutdown().await;

    let mut seen = seen.lock().unwrap().clone();
    seen.sort();
    assert_eq!(seen, vec![0, 1, 2, 3, 4]);
}

#[tokio::test]
async fn given_full_queue_when_enqueued_then_queue_full_and_dropped() {
    let (processor, seen, _) = recorder();
    let pool = WorkerPool::start(processor, config(2, 1), Metrics::default());

    pool.enqueue(1).unwrap();
    pool.enqueue(2).unwrap();
    let result = pool.enqueue(3);

    assert!(matches!(result, Err(JobError::QueueFull { pool: "recorder", .. })));
    assert_eq!(pool.queue_depth(), 2);

    pool.shutdown().await;
    assert_eq!(seen.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn given_queued_jobs_when_shutdown_then_drained_once_with_cancelled_token() {
    let (processor, seen, cancelled_seen) = recorder();
    let pool = WorkerPool::start(processor, config(10, 1), Metrics::default());

    for job in 0..3 {
        pool.enqueue(job).unwrap();
    }
    pool.shutdown().await;

    assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
    assert_eq!(cancelled_seen.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn given_stopped_pool_when_enqueued_then_pool_stopped() {
    let (processor, _, _) = recorder();
    let pool = WorkerPool::start(processor, config(10, 1), Metrics::default());

    pool.shutdown().await;

    assert!(matches!(
        pool.enqueue(1),
        Err(JobError::PoolStopped { pool: "recorder", .. })
    ));
}

#[tokio::test]
async fn given_stopped_pool_when_shutdown_again_then_returns() {
    let (processor, _, _) = recorder();
    let pool = WorkerPool::start(processor, config(10, 3), Metrics::default());

    pool.shutdown().await;
    pool.shutdown().await;
}
