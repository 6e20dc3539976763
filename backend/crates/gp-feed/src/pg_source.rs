use crate::{
    FeedError, NotificationSource, NotificationStream, Result as FeedErrorResult, quote_identifier,
};

use async_trait::async_trait;
use log::debug;
use sqlx::postgres::{PgListener, PgPool};
use sqlx::Executor;

/// Postgres LISTEN/NOTIFY source backed by the shared pool
#[derive(Clone)]
pub struct PgNotificationSource {
    pool: PgPool,
}

impl PgNotificationSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationSource for PgNotificationSource {
    async fn ping(&self) -> FeedErrorResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| FeedError::unreachable(e.to_string()))?;
        Ok(())
    }

    async fn listen(&self, channel: &str) -> FeedErrorResult<Box<dyn NotificationStream>> {
        let mut listener = PgListener::connect_with(&self.pool).await?;

        let statement = format!("LISTEN {}", quote_identifier(channel));
        (&mut listener).execute(statement.as_str()).await?;
        debug!("Issued {}", statement);

        Ok(Box::new(PgNotificationStream { listener }))
    }
}

/// One dedicated listener connection
pub struct PgNotificationStream {
    listener: PgListener,
}

#[async_trait]
impl NotificationStream for PgNotificationStream {
    async fn recv(&mut self) -> FeedErrorResult<String> {
        // try_recv reports a lost connection as None instead of silently
        // reconnecting, so the bridge owns the backoff.
        match self.listener.try_recv().await? {
            Some(notification) => Ok(notification.payload().to_string()),
            None => Err(FeedError::connection_lost("listener connection closed")),
        }
    }
}
