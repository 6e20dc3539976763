use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Hands out strictly increasing event IDs per tenant, starting at 1.
///
/// Counters are created lazily under the write lock. Once a tenant's counter
/// exists, lookups only take the read lock and the increment itself is a
/// lock-free `fetch_add`.
#[derive(Debug, Default)]
pub struct EventSequencer {
    counters: RwLock<HashMap<String, Arc<AtomicU64>>>,
}

impl EventSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self, tenant_id: &str) -> u64 {
        if let Some(counter) = self
            .counters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(tenant_id)
        {
            return counter.fetch_add(1, Ordering::Relaxed) + 1;
        }

        let counter = self
            .counters
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(tenant_id.to_string())
            .or_insert_with(|| Arc::new(AtomicU64::new(0)))
            .clone();

        counter.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Last ID issued for a tenant (0 if none)
    pub fn current(&self, tenant_id: &str) -> u64 {
        self.counters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(tenant_id)
            .map(|counter| counter.load(Ordering::Relaxed))
            .unwrap_or(0)
    }
}
