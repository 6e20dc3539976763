use crate::Event;

use gp_config::BufferConfig;

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use log::{debug, info};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Per-tenant, memory-only replay buffer.
///
/// Each tenant keeps its events in ascending ID order, at most `max_len` of
/// them, none older than `max_age` after an append. The lock is never held
/// across an await point.
#[derive(Debug)]
pub struct EventBuffer {
    tenants: RwLock<HashMap<String, VecDeque<Arc<Event>>>>,
    max_len: usize,
    max_age: Duration,
}

impl EventBuffer {
    pub fn new(max_len: usize, max_age: Duration) -> Self {
        Self {
            tenants: RwLock::new(HashMap::new()),
            max_len: max_len.max(1),
            max_age,
        }
    }

    pub fn from_config(config: &BufferConfig) -> Self {
        Self::new(config.max_len, Duration::from_secs(config.max_age_secs))
    }

    pub fn append(&self, tenant_id: &str, event: Arc<Event>) {
        let cutoff = self.cutoff();
        let mut tenants = self.tenants.write().unwrap_or_else(PoisonError::into_inner);
        let events = tenants.entry(tenant_id.to_string()).or_default();

        // IDs are handed out before the append, so two concurrent publishers
        // for one tenant can arrive here out of order.
        match events.back() {
            Some(last) if last.id >= event.id => {
                let at = events.partition_point(|e| e.id < event.id);
                if events.get(at).is_some_and(|e| e.id == event.id) {
                    return;
                }
                events.insert(at, event);
            }
            _ => events.push_back(event),
        }

        while events.front().is_some_and(|e| e.timestamp < cutoff) {
            events.pop_front();
        }
        while events.len() > self.max_len {
            events.pop_front();
        }
    }

    /// Events with ID greater than `last_id`, ascending
    pub fn since(&self, tenant_id: &str, last_id: u64) -> Vec<Arc<Event>> {
        let tenants = self.tenants.read().unwrap_or_else(PoisonError::into_inner);
        let Some(events) = tenants.get(tenant_id) else {
            return Vec::new();
        };

        let start = events.partition_point(|e| e.id <= last_id);
        events.range(start..).cloned().collect()
    }

    /// Smallest retained ID for the tenant, or 0 if nothing is retained
    pub fn oldest_id(&self, tenant_id: &str) -> u64 {
        self.tenants
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(tenant_id)
            .and_then(|events| events.front())
            .map(|e| e.id)
            .unwrap_or(0)
    }

    pub fn len(&self, tenant_id: &str) -> usize {
        self.tenants
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(tenant_id)
            .map(VecDeque::len)
            .unwrap_or(0)
    }

    pub fn is_empty(&self, tenant_id: &str) -> bool {
        self.len(tenant_id) == 0
    }

    pub fn tenant_count(&self) -> usize {
        self.tenants
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Drop every tenant whose newest event is older than `max_age`.
    /// Returns the number of tenants removed.
    pub fn sweep(&self) -> usize {
        let cutoff = self.cutoff();
        let mut tenants = self.tenants.write().unwrap_or_else(PoisonError::into_inner);
        let before = tenants.len();

        tenants.retain(|_, events| events.back().is_some_and(|e| e.timestamp >= cutoff));

        before - tenants.len()
    }

    /// Run `sweep` every `interval` until cancelled
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let buffer = Arc::clone(self);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("Event buffer sweeper stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let removed = buffer.sweep();
                        if removed > 0 {
                            info!("Swept {} idle tenant buffer(s)", removed);
                        }
                    }
                }
            }
        })
    }

    fn cutoff(&self) -> DateTime<Utc> {
        let max_age = TimeDelta::from_std(self.max_age).unwrap_or(TimeDelta::MAX);
        Utc::now()
            .checked_sub_signed(max_age)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}
