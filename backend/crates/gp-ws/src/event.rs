use bytes::Bytes;
use chrono::{DateTime, Utc};

/// A tenant-scoped notification. Built once by the hub and shared as
/// `Arc<Event>` between the replay buffer and outbound frames.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub event_type: String,
    /// Tenant-scoped sequence number, starting at 1
    pub id: u64,
    pub tenant_id: String,
    /// Opaque JSON body, embedded verbatim in the outbound envelope
    pub data: Bytes,
    pub timestamp: DateTime<Utc>,
}

impl Event {
    pub fn new(
        event_type: impl Into<String>,
        id: u64,
        tenant_id: impl Into<String>,
        data: Bytes,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            id,
            tenant_id: tenant_id.into(),
            data,
            timestamp: Utc::now(),
        }
    }
}
