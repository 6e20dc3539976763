use crate::ConnectionId;

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// The hub's view of one live connection.
///
/// Cloning is cheap; every clone refers to the same outbound queue, liveness
/// counter, and close token.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    pub id: ConnectionId,
    pub tenant_id: String,
    pub outbound: mpsc::Sender<Arc<str>>,
    pub connected_at: DateTime<Utc>,
    missed_pings: Arc<AtomicU32>,
    close: CancellationToken,
}

impl ConnectionHandle {
    /// Create a handle and the receiving end of its outbound queue
    pub fn new(
        tenant_id: impl Into<String>,
        send_buffer_size: usize,
    ) -> (Self, mpsc::Receiver<Arc<str>>) {
        let (outbound, outbound_rx) = mpsc::channel(send_buffer_size.max(1));

        let handle = Self {
            id: ConnectionId::new(),
            tenant_id: tenant_id.into(),
            outbound,
            connected_at: Utc::now(),
            missed_pings: Arc::new(AtomicU32::new(0)),
            close: CancellationToken::new(),
        };

        (handle, outbound_rx)
    }

    /// Signal the connection to close. Safe to call any number of times.
    pub fn close(&self) {
        self.close.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.close.is_cancelled()
    }

    pub fn close_token(&self) -> &CancellationToken {
        &self.close
    }

    /// True when every queued frame has been taken by the write pump
    pub fn is_drained(&self) -> bool {
        self.outbound.is_closed() || self.outbound.capacity() == self.outbound.max_capacity()
    }

    pub(crate) fn ping_sent(&self) -> u32 {
        self.missed_pings.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn pong_received(&self) {
        self.missed_pings.store(0, Ordering::Relaxed);
    }

    pub fn missed_pings(&self) -> u32 {
        self.missed_pings.load(Ordering::Relaxed)
    }
}
