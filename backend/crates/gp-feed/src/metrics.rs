use metrics::counter;

/// Metrics collector for the change feed bridge
#[derive(Clone)]
pub struct Metrics {
    prefix: &'static str,
}

impl Metrics {
    pub fn new() -> Self {
        Self { prefix: "gp_feed" }
    }

    pub fn subscribed(&self) {
        counter!(format!("{}.subscriptions", self.prefix)).increment(1);
    }

    pub fn connection_lost(&self) {
        counter!(format!("{}.connection_lost", self.prefix)).increment(1);
    }

    pub fn reconnect_scheduled(&self) {
        counter!(format!("{}.reconnects", self.prefix)).increment(1);
    }

    pub fn notification_received(&self) {
        counter!(format!("{}.notifications.received", self.prefix)).increment(1);
    }

    pub fn notification_forwarded(&self) {
        counter!(format!("{}.notifications.forwarded", self.prefix)).increment(1);
    }

    pub fn notification_dropped(&self, reason: &str) {
        counter!(format!("{}.notifications.dropped.{}", self.prefix, reason)).increment(1);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
