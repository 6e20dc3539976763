pub mod backoff;
pub mod bridge;
pub mod channel;
pub mod error;
pub mod metrics;
pub mod payload;
pub mod pg_source;
pub mod sink;
pub mod source;

pub use backoff::Backoff;
pub use bridge::ChangeFeedBridge;
pub use channel::{quote_identifier, validate_channel_name};
pub use error::{FeedError, Result};
pub use metrics::Metrics;
pub use payload::ChangePayload;
pub use pg_source::{PgNotificationSource, PgNotificationStream};
pub use sink::EventSink;
pub use source::{NotificationSource, NotificationStream};

#[cfg(test)]
mod tests;
