use metrics::{counter, gauge};

/// Metrics collector for the hub and its connections
#[derive(Clone)]
pub struct Metrics {
    prefix: &'static str,
}

impl Metrics {
    pub fn new() -> Self {
        Self { prefix: "gp_ws" }
    }

    /// Record connection actor started
    pub fn connection_established(&self) {
        counter!(format!("{}.connections.established", self.prefix)).increment(1);
    }

    /// Record connection actor finished
    pub fn connection_closed(&self, reason: &str) {
        counter!(format!("{}.connections.closed", self.prefix)).increment(1);
        counter!(format!("{}.connections.closed.{}", self.prefix, reason)).increment(1);
    }

    /// Published by the hub loop whenever membership changes
    pub fn active_connections(&self, count: usize) {
        gauge!(format!("{}.connections.active", self.prefix)).set(count as f64);
    }

    pub fn admission_rejected(&self, reason: &str) {
        counter!(format!("{}.admission.rejected", self.prefix)).increment(1);
        counter!(format!("{}.admission.rejected.{}", self.prefix, reason)).increment(1);
    }

    pub fn slow_consumer_disconnected(&self) {
        counter!(format!("{}.connections.slow_consumer", self.prefix)).increment(1);
    }

    /// Record broadcast fanned out to `recipients` connections
    pub fn broadcast_delivered(&self, recipients: usize) {
        counter!(format!("{}.broadcast.published", self.prefix)).increment(1);
        counter!(format!("{}.broadcast.deliveries", self.prefix)).increment(recipients as u64);
    }

    pub fn broadcast_dropped(&self, reason: &str) {
        counter!(format!("{}.broadcast.dropped", self.prefix)).increment(1);
        counter!(format!("{}.broadcast.dropped.{}", self.prefix, reason)).increment(1);
    }

    /// Depth of the hub's broadcast queue at the time of a submission
    pub fn broadcast_queue_depth(&self, depth: usize) {
        gauge!(format!("{}.broadcast.queue_depth", self.prefix)).set(depth as f64);
    }

    pub fn replay_served(&self, events: usize) {
        counter!(format!("{}.replay.served", self.prefix)).increment(1);
        counter!(format!("{}.replay.events", self.prefix)).increment(events as u64);
    }

    pub fn replay_refused(&self) {
        counter!(format!("{}.replay.refused", self.prefix)).increment(1);
    }

    /// Record message received from client
    pub fn message_received(&self, message_type: &str) {
        counter!(format!("{}.messages.received", self.prefix)).increment(1);
        counter!(format!(
            "{}.messages.received.{}",
            self.prefix, message_type
        ))
        .increment(1);
    }

    pub fn message_ignored(&self, reason: &str) {
        counter!(format!("{}.messages.ignored.{}", self.prefix, reason)).increment(1);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
