use gp_ws::EventHub;

use bytes::Bytes;

/// Destination for change notifications
pub trait EventSink: Send + Sync + 'static {
    /// Publish `data` to the tenant's connections, returning the assigned ID
    fn publish(&self, event_type: &str, tenant_id: &str, data: Bytes) -> gp_ws::Result<u64>;
}

impl EventSink for EventHub {
    fn publish(&self, event_type: &str, tenant_id: &str, data: Bytes) -> gp_ws::Result<u64> {
        self.broadcast_event(event_type, tenant_id, data)
    }
}
