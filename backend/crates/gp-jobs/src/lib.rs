pub mod audit_processor;
pub mod circuit_breaker;
pub mod embed_processor;
pub mod error;
pub mod http_embedding_backend;
pub mod jobs;
pub mod metrics;
pub mod store;
pub mod worker_pool;

pub use audit_processor::AuditProcessor;
pub use circuit_breaker::{BreakerError, CircuitBreaker, CircuitState};
pub use embed_processor::EmbedProcessor;
pub use error::{JobError, Result};
pub use http_embedding_backend::HttpEmbeddingBackend;
pub use jobs::{AuditJob, EmbedJob};
pub use metrics::Metrics;
pub use store::{AuditStore, EmbeddingBackend, EmbeddingStore};
pub use worker_pool::{JobProcessor, WorkerPool, WorkerPoolConfig};

#[cfg(test)]
mod tests;
