mod worker_pool;

use crate::{AuditJob, AuditStore, EmbedJob, EmbeddingBackend, EmbeddingStore, JobError};

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

/// Fails the first `failures` calls, then returns a fixed vector
pub(crate) struct FlakyBackend {
    pub failures: usize,
    pub calls: AtomicUsize,
}

impl FlakyBackend {
    pub fn failing(failures: usize) -> Self {
        Self {
            failures,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingBackend for FlakyBackend {
    async fn embed(&self, _input: &str) -> crate::Result<Vec<f32>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(JobError::backend(format!("failure {}", call + 1)));
        }
        Ok(vec![0.1, 0.2, 0.3])
    }
}

#[derive(Default)]
pub(crate) struct RecordingStore {
    pub embeddings: Mutex<Vec<(String, String, Vec<f32>)>>,
    pub audits: Mutex<Vec<AuditJob>>,
    pub fail: bool,
}

#[async_trait]
impl EmbeddingStore for RecordingStore {
    async fn update_node_embedding(
        &self,
        tenant_id: &str,
        node_id: &str,
        vector: &[f32],
    ) -> crate::Result<()> {
        self.embeddings.lock().unwrap().push((
            tenant_id.to_string(),
            node_id.to_string(),
            vector.to_vec(),
        ));
        Ok(())
    }
}

#[async_trait]
impl AuditStore for RecordingStore {
    async fn record_audit(&self, entry: &AuditJob) -> crate::Result<()> {
        self.audits.lock().unwrap().push(entry.clone());
        if self.fail {
            return Err(JobError::persistence("audit table unavailable"));
        }
        Ok(())
    }
}

pub(crate) fn embed_job(node_id: &str) -> EmbedJob {
    EmbedJob {
        tenant_id: "tenant-a".to_string(),
        node_id: node_id.to_string(),
        text: "some node text".to_string(),
    }
}
