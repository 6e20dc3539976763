use crate::{
    Backoff, ChangePayload, EventSink, Metrics, NotificationSource, NotificationStream,
    Result as FeedErrorResult, validate_channel_name,
};

use gp_config::ChangeFeedConfig;

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use log::{debug, error, info, trace, warn};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Forwards database change notifications into the event sink.
///
/// Startup fails only when the channel name is invalid or the database cannot
/// be reached. After that, lost listener connections are retried forever with
/// jittered exponential backoff until the token is cancelled.
pub struct ChangeFeedBridge {
    task: JoinHandle<()>,
    cancel: CancellationToken,
}

impl ChangeFeedBridge {
    pub async fn start(
        source: Arc<dyn NotificationSource>,
        sink: Arc<dyn EventSink>,
        config: &ChangeFeedConfig,
        metrics: Metrics,
        cancel: CancellationToken,
    ) -> FeedErrorResult<Self> {
        validate_channel_name(&config.channel)?;

        source.ping().await.inspect_err(|e| {
            error!("Change feed connectivity check failed: {}", e);
        })?;

        let subscriber = Subscriber {
            source,
            sink,
            channel: config.channel.clone(),
            wait_deadline: Duration::from_secs(config.wait_deadline_secs),
            backoff: Backoff::from_config(config),
            metrics,
            cancel: cancel.clone(),
        };

        let task = tokio::spawn(subscriber.run());

        Ok(Self { task, cancel })
    }

    /// Request the subscribe loop to stop. Does not wait.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the subscribe loop to exit. Call after cancelling.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            error!("Change feed task failed: {}", e);
        }
    }
}

struct Subscriber {
    source: Arc<dyn NotificationSource>,
    sink: Arc<dyn EventSink>,
    channel: String,
    wait_deadline: Duration,
    backoff: Backoff,
    metrics: Metrics,
    cancel: CancellationToken,
}

impl Subscriber {
    async fn run(mut self) {
        info!("Change feed bridge starting on channel '{}'", self.channel);

        loop {
            let listened = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                result = self.source.listen(&self.channel) => result,
            };

            match listened {
                Ok(stream) => {
                    self.backoff.reset();
                    self.metrics.subscribed();
                    info!("Listening for changes on '{}'", self.channel);

                    match self.consume(stream).await {
                        Ok(()) => break,
                        Err(e) => {
                            self.metrics.connection_lost();
                            warn!("Change feed connection lost: {}", e);
                        }
                    }
                }
                Err(e) => warn!("Change feed subscribe failed: {}", e),
            }

            let delay = self.backoff.next_delay();
            self.metrics.reconnect_scheduled();
            info!(
                "Reconnecting change feed in {:?} (attempt {})",
                delay,
                self.backoff.attempt()
            );

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        info!("Change feed bridge stopped");
    }

    /// Returns Ok when cancelled, Err when the subscription is lost.
    async fn consume(&self, mut stream: Box<dyn NotificationStream>) -> FeedErrorResult<()> {
        loop {
            let waited = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Ok(()),
                waited = tokio::time::timeout(self.wait_deadline, stream.recv()) => waited,
            };

            match waited {
                Err(_) => trace!("No change notifications within {:?}", self.wait_deadline),
                Ok(Ok(payload)) => self.forward(payload),
                Ok(Err(e)) => return Err(e),
            }
        }
    }

    fn forward(&self, raw: String) {
        self.metrics.notification_received();

        let payload = match ChangePayload::parse(&raw) {
            Ok(payload) => payload,
            Err(e) => {
                self.metrics.notification_dropped("invalid_payload");
                warn!("Dropping change notification: {}", e);
                return;
            }
        };

        match self
            .sink
            .publish(&payload.event_type, &payload.tenant_id, Bytes::from(raw))
        {
            Ok(id) => {
                self.metrics.notification_forwarded();
                debug!(
                    "Forwarded '{}' for tenant {} as event {}",
                    payload.event_type, payload.tenant_id, id
                );
            }
            Err(e) => {
                self.metrics.notification_dropped("sink");
                warn!(
                    "Change notification for tenant {} not published: {}",
                    payload.tenant_id, e
                );
            }
        }
    }
}
