use crate::Result as FeedErrorResult;

use async_trait::async_trait;

/// Something that can be subscribed to for change notifications
#[async_trait]
pub trait NotificationSource: Send + Sync + 'static {
    /// Connectivity probe
    async fn ping(&self) -> FeedErrorResult<()>;

    /// Open a dedicated listener on `channel`. The name has already been
    /// validated.
    async fn listen(&self, channel: &str) -> FeedErrorResult<Box<dyn NotificationStream>>;
}

/// A live subscription
#[async_trait]
pub trait NotificationStream: Send {
    /// Next raw payload. An error means the subscription is gone.
    ///
    /// Must be cancel-safe: the bridge drops this future when its wait
    /// deadline expires.
    async fn recv(&mut self) -> FeedErrorResult<String>;
}
