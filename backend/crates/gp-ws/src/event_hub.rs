use crate::{
    ConnectionHandle, ConnectionId, Event, EventBuffer, EventSequencer, HubStats, Metrics,
    Result as WsErrorResult, WsError, wire,
};

use gp_config::HubConfig;

use std::collections::{HashMap, HashSet};
use std::panic::Location;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;

use bytes::Bytes;
use error_location::ErrorLocation;
use log::{debug, info, warn};
use serde_json::value::RawValue;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;

const STATS_QUEUE_CAPACITY: usize = 16;

struct TenantBroadcast {
    tenant_id: String,
    frame: Arc<str>,
}

/// Cloneable handle to the hub's coordinating task.
///
/// Membership and counters are owned by that task. Callers only submit
/// registrations, unregistrations and broadcasts, none of which block.
#[derive(Clone)]
pub struct EventHub {
    shared: Arc<Shared>,
}

struct Shared {
    register_tx: mpsc::Sender<ConnectionHandle>,
    unregister_tx: mpsc::UnboundedSender<ConnectionId>,
    broadcast_tx: mpsc::Sender<TenantBroadcast>,
    stats_tx: mpsc::Sender<oneshot::Sender<HubStats>>,
    shutdown_tx: StdMutex<Option<oneshot::Sender<()>>>,
    hub_task: Mutex<Option<JoinHandle<()>>>,
    client_count: Arc<AtomicUsize>,
    sequencer: EventSequencer,
    buffer: Arc<EventBuffer>,
    max_payload_bytes: usize,
    metrics: Metrics,
}

impl EventHub {
    /// Spawn the coordinating task. Must be called from within a Tokio runtime.
    pub fn start(config: &HubConfig, buffer: Arc<EventBuffer>, metrics: Metrics) -> Self {
        let (register_tx, register_rx) = mpsc::channel(config.register_queue_capacity.max(1));
        let (unregister_tx, unregister_rx) = mpsc::unbounded_channel();
        let (broadcast_tx, broadcast_rx) = mpsc::channel(config.broadcast_queue_capacity.max(1));
        let (stats_tx, stats_rx) = mpsc::channel(STATS_QUEUE_CAPACITY);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let client_count = Arc::new(AtomicUsize::new(0));

        let hub_loop = HubLoop {
            connections: HashMap::new(),
            tenants: HashMap::new(),
            client_count: Arc::clone(&client_count),
            max_total: config.max_total,
            max_per_tenant: config.max_per_tenant,
            shutdown_timeout: Duration::from_millis(config.shutdown_timeout_ms),
            shutdown_poll: Duration::from_millis(config.shutdown_poll_ms.max(1)),
            metrics: metrics.clone(),
        };

        let hub_task = tokio::spawn(hub_loop.run(
            register_rx,
            unregister_rx,
            broadcast_rx,
            stats_rx,
            shutdown_rx,
        ));

        Self {
            shared: Arc::new(Shared {
                register_tx,
                unregister_tx,
                broadcast_tx,
                stats_tx,
                shutdown_tx: StdMutex::new(Some(shutdown_tx)),
                hub_task: Mutex::new(Some(hub_task)),
                client_count,
                sequencer: EventSequencer::new(),
                buffer,
                max_payload_bytes: config.max_payload_bytes,
                metrics,
            }),
        }
    }

    pub fn buffer(&self) -> &Arc<EventBuffer> {
        &self.shared.buffer
    }

    pub fn sequencer(&self) -> &EventSequencer {
        &self.shared.sequencer
    }

    /// Submit a connection for admission.
    ///
    /// Admission limits are enforced by the hub task; a rejected connection
    /// is closed through its handle rather than reported here. An error means
    /// the submission itself failed, and the connection has been closed.
    #[track_caller]
    pub fn register(&self, handle: ConnectionHandle) -> WsErrorResult<()> {
        match self.shared.register_tx.try_send(handle) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(handle)) => {
                warn!(
                    "Registration queue full, closing connection {} (tenant {})",
                    handle.id, handle.tenant_id
                );
                self.shared.metrics.admission_rejected("queue_full");
                handle.close();
                Err(WsError::AdmissionRejected {
                    reason: "registration queue full".to_string(),
                    location: ErrorLocation::from(Location::caller()),
                })
            }
            Err(TrySendError::Closed(handle)) => {
                handle.close();
                Err(WsError::HubStopped {
                    location: ErrorLocation::from(Location::caller()),
                })
            }
        }
    }

    /// Idempotent; unknown or already-removed IDs are ignored
    pub fn unregister(&self, id: ConnectionId) {
        // Fails only once the hub task has exited, when membership is gone anyway.
        let _ = self.shared.unregister_tx.send(id);
    }

    /// Queue a pre-encoded frame for every connection of a tenant
    #[track_caller]
    pub fn broadcast_to_tenant(&self, tenant_id: &str, frame: Arc<str>) -> WsErrorResult<()> {
        self.check_payload(tenant_id, frame.len())?;

        let broadcast_tx = &self.shared.broadcast_tx;
        match broadcast_tx.try_send(TenantBroadcast {
            tenant_id: tenant_id.to_string(),
            frame,
        }) {
            Ok(()) => {
                self.shared
                    .metrics
                    .broadcast_queue_depth(broadcast_tx.max_capacity() - broadcast_tx.capacity());
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                warn!("Broadcast queue full, dropping message for tenant {}", tenant_id);
                self.shared.metrics.broadcast_dropped("queue_full");
                Err(WsError::QueueFull {
                    queue: "broadcast",
                    location: ErrorLocation::from(Location::caller()),
                })
            }
            Err(TrySendError::Closed(_)) => Err(WsError::HubStopped {
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    /// Sequence, buffer, and fan out an event. Returns the assigned ID.
    ///
    /// `data` must be a JSON document; it is embedded verbatim in the frame.
    #[track_caller]
    pub fn broadcast_event(
        &self,
        event_type: &str,
        tenant_id: &str,
        data: Bytes,
    ) -> WsErrorResult<u64> {
        if let Err(e) = serde_json::from_slice::<&RawValue>(&data) {
            warn!(
                "Dropping '{}' event for tenant {}: data is not valid JSON: {}",
                event_type, tenant_id, e
            );
            self.shared.metrics.broadcast_dropped("serialization");
            return Err(WsError::SerializationFailure {
                source: e,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let id = self.shared.sequencer.next(tenant_id);
        let event = Arc::new(Event::new(event_type, id, tenant_id, data));
        let frame = wire::encode_event(&event)?;

        self.check_payload(tenant_id, frame.len())?;
        self.shared.buffer.append(tenant_id, event);
        self.broadcast_to_tenant(tenant_id, frame)?;

        Ok(id)
    }

    /// Queue every buffered event after `last_event_id` on the connection.
    ///
    /// Refuses with `ReplayTooOld` when the client's position has already
    /// been evicted. Stops quietly if the outbound queue fills.
    #[track_caller]
    pub fn replay(&self, handle: &ConnectionHandle, last_event_id: u64) -> WsErrorResult<usize> {
        let oldest_id = self.shared.buffer.oldest_id(&handle.tenant_id);
        if oldest_id > 0 && last_event_id > 0 && last_event_id < oldest_id {
            self.shared.metrics.replay_refused();
            return Err(WsError::ReplayTooOld {
                last_event_id,
                oldest_id,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let mut queued = 0;
        for event in self.shared.buffer.since(&handle.tenant_id, last_event_id) {
            let frame = match wire::encode_event(&event) {
                Ok(frame) => frame,
                Err(e) => {
                    warn!("Skipping event {} during replay: {}", event.id, e);
                    continue;
                }
            };

            if handle.outbound.try_send(frame).is_err() {
                debug!(
                    "Replay to connection {} stopped after {} event(s): queue full",
                    handle.id, queued
                );
                break;
            }
            queued += 1;
        }

        self.shared.metrics.replay_served(queued);
        Ok(queued)
    }

    /// `true` if the replay was honoured, `false` if the client must reset
    pub fn replay_events(&self, handle: &ConnectionHandle, last_event_id: u64) -> bool {
        match self.replay(handle, last_event_id) {
            Ok(_) => true,
            Err(e) => {
                debug!("Connection {}: {}", handle.id, e);
                false
            }
        }
    }

    /// Lock-free snapshot published by the hub task
    pub fn client_count(&self) -> usize {
        self.shared.client_count.load(Ordering::Acquire)
    }

    /// Membership as seen by the hub task. Empty once the hub has stopped.
    pub async fn stats(&self) -> HubStats {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.shared.stats_tx.send(reply_tx).await.is_err() {
            return HubStats::default();
        }
        reply_rx.await.unwrap_or_default()
    }

    /// Two-phase shutdown: announce and drain, then close everything.
    /// Returns once the hub task has exited. Safe to call more than once.
    pub async fn shutdown(&self) {
        let shutdown_tx = self
            .shared
            .shutdown_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(shutdown_tx) = shutdown_tx {
            let _ = shutdown_tx.send(());
        }

        let mut hub_task = self.shared.hub_task.lock().await;
        if let Some(task) = hub_task.take()
            && let Err(e) = task.await
        {
            warn!("Event hub task ended abnormally: {}", e);
        }
    }

    #[track_caller]
    fn check_payload(&self, tenant_id: &str, size: usize) -> WsErrorResult<()> {
        if size > self.shared.max_payload_bytes {
            warn!(
                "Dropping broadcast for tenant {}: {} bytes exceeds limit of {}",
                tenant_id, size, self.shared.max_payload_bytes
            );
            self.shared.metrics.broadcast_dropped("too_large");
            return Err(WsError::PayloadTooLarge {
                size,
                max: self.shared.max_payload_bytes,
                location: ErrorLocation::from(Location::caller()),
            });
        }
        Ok(())
    }
}

struct HubLoop {
    connections: HashMap<ConnectionId, ConnectionHandle>,
    /// Members per tenant; a tenant's entry is removed when it empties
    tenants: HashMap<String, HashSet<ConnectionId>>,
    client_count: Arc<AtomicUsize>,
    max_total: usize,
    max_per_tenant: usize,
    shutdown_timeout: Duration,
    shutdown_poll: Duration,
    metrics: Metrics,
}

impl HubLoop {
    async fn run(
        mut self,
        mut register_rx: mpsc::Receiver<ConnectionHandle>,
        mut unregister_rx: mpsc::UnboundedReceiver<ConnectionId>,
        mut broadcast_rx: mpsc::Receiver<TenantBroadcast>,
        mut stats_rx: mpsc::Receiver<oneshot::Sender<HubStats>>,
        mut shutdown_rx: oneshot::Receiver<()>,
    ) {
        info!("Event hub started");

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown_rx => break,
                // Registration before unregistration, so a connection that
                // disconnects immediately never leaks a slot.
                Some(handle) = register_rx.recv() => self.admit(handle),
                Some(id) = unregister_rx.recv() => {
                    self.remove(id);
                }
                Some(broadcast) = broadcast_rx.recv() => self.fan_out(broadcast),
                Some(reply) = stats_rx.recv() => {
                    let _ = reply.send(self.stats());
                }
            }
        }

        self.close_all().await;

        register_rx.close();
        while let Ok(handle) = register_rx.try_recv() {
            handle.close();
        }

        info!("Event hub stopped");
    }

    fn admit(&mut self, handle: ConnectionHandle) {
        if handle.is_closed() {
            debug!("Connection {} closed before admission, discarding", handle.id);
            return;
        }
        if self.connections.contains_key(&handle.id) {
            return;
        }

        let tenant_count = self
            .tenants
            .get(&handle.tenant_id)
            .map(HashSet::len)
            .unwrap_or(0);

        let rejection = if self.connections.len() >= self.max_total {
            Some("global_limit")
        } else if tenant_count >= self.max_per_tenant {
            Some("tenant_limit")
        } else {
            None
        };

        if let Some(reason) = rejection {
            warn!(
                "Rejecting connection {} for tenant {}: {} ({} total, {} for tenant)",
                handle.id,
                handle.tenant_id,
                reason,
                self.connections.len(),
                tenant_count
            );
            self.metrics.admission_rejected(reason);
            handle.close();
            return;
        }

        debug!(
            "Admitted connection {} for tenant {}",
            handle.id, handle.tenant_id
        );
        self.tenants
            .entry(handle.tenant_id.clone())
            .or_default()
            .insert(handle.id);
        self.connections.insert(handle.id, handle);
        self.publish_count();
    }

    fn remove(&mut self, id: ConnectionId) -> Option<ConnectionHandle> {
        let handle = self.connections.remove(&id)?;

        if let Some(members) = self.tenants.get_mut(&handle.tenant_id) {
            members.remove(&id);
            if members.is_empty() {
                self.tenants.remove(&handle.tenant_id);
            }
        }

        debug!("Removed connection {} (tenant {})", id, handle.tenant_id);
        self.publish_count();
        Some(handle)
    }

    fn fan_out(&mut self, broadcast: TenantBroadcast) {
        let Some(members) = self.tenants.get(&broadcast.tenant_id) else {
            return;
        };

        let mut delivered = 0;
        let mut evicted = Vec::new();

        for id in members {
            let Some(conn) = self.connections.get(id) else {
                continue;
            };

            match conn.outbound.try_send(Arc::clone(&broadcast.frame)) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!(
                        "Connection {} (tenant {}) is too slow, disconnecting",
                        conn.id, conn.tenant_id
                    );
                    self.metrics.slow_consumer_disconnected();
                    evicted.push(*id);
                }
                Err(TrySendError::Closed(_)) => evicted.push(*id),
            }
        }

        self.metrics.broadcast_delivered(delivered);

        for id in evicted {
            if let Some(conn) = self.remove(id) {
                conn.close();
            }
        }
    }

    fn stats(&self) -> HubStats {
        HubStats {
            total: self.connections.len(),
            per_tenant: self
                .tenants
                .iter()
                .map(|(tenant_id, members)| (tenant_id.clone(), members.len()))
                .collect(),
        }
    }

    async fn close_all(&mut self) {
        info!(
            "Event hub shutting down, draining {} connection(s)",
            self.connections.len()
        );

        let frame = wire::shutdown_frame("server shutting down");
        for conn in self.connections.values() {
            let _ = conn.outbound.try_send(Arc::clone(&frame));
        }

        let deadline = Instant::now() + self.shutdown_timeout;
        while !self.connections.values().all(ConnectionHandle::is_drained) {
            if Instant::now() >= deadline {
                warn!(
                    "Shutdown drain timed out after {:?}, closing remaining connections",
                    self.shutdown_timeout
                );
                break;
            }
            tokio::time::sleep(self.shutdown_poll).await;
        }

        for (_, conn) in self.connections.drain() {
            conn.close();
        }
        self.tenants.clear();
        self.publish_count();
    }

    fn publish_count(&self) {
        let count = self.connections.len();
        self.client_count.store(count, Ordering::Release);
        self.metrics.active_connections(count);
    }
}
