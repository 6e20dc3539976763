use metrics::{counter, gauge};

/// Metrics collector for background job pools
#[derive(Clone)]
pub struct Metrics {
    prefix: &'static str,
}

impl Metrics {
    pub fn new() -> Self {
        Self { prefix: "gp_jobs" }
    }

    pub fn job_enqueued(&self, pool: &str, depth: usize) {
        counter!(format!("{}.{}.enqueued", self.prefix, pool)).increment(1);
        gauge!(format!("{}.{}.queue_depth", self.prefix, pool)).set(depth as f64);
    }

    pub fn job_dropped(&self, pool: &str, reason: &str) {
        counter!(format!("{}.{}.dropped.{}", self.prefix, pool, reason)).increment(1);
    }

    pub fn job_completed(&self, pool: &str) {
        counter!(format!("{}.{}.completed", self.prefix, pool)).increment(1);
    }

    pub fn job_failed(&self, pool: &str) {
        counter!(format!("{}.{}.failed", self.prefix, pool)).increment(1);
    }

    pub fn job_retried(&self, pool: &str) {
        counter!(format!("{}.{}.retried", self.prefix, pool)).increment(1);
    }

    pub fn breaker_rejected(&self) {
        counter!(format!("{}.breaker.rejected", self.prefix)).increment(1);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
