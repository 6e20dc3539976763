pub mod app_state;
pub mod connection_actor;
pub mod connection_config;
pub mod connection_handle;
pub mod connection_id;
pub mod error;
pub mod event;
pub mod event_buffer;
pub mod event_hub;
pub mod event_sequencer;
pub mod hub_stats;
pub mod metrics;
pub mod shutdown_coordinator;
pub mod wire;

pub use app_state::{AppState, handler};
pub use connection_actor::{AUTH_EXPIRED_CLOSE_CODE, ConnectionActor};
pub use connection_config::ConnectionConfig;
pub use connection_handle::ConnectionHandle;
pub use connection_id::ConnectionId;
pub use error::{Result, WsError};
pub use event::Event;
pub use event_buffer::EventBuffer;
pub use event_hub::EventHub;
pub use event_sequencer::EventSequencer;
pub use hub_stats::HubStats;
pub use metrics::Metrics;
pub use shutdown_coordinator::ShutdownCoordinator;
pub use wire::ClientMessage;

#[cfg(test)]
mod tests;
