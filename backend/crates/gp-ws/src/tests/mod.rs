mod connection_actor;
mod event_sequencer;

use crate::{EventBuffer, EventHub, Metrics};

use gp_config::HubConfig;

use std::sync::Arc;
use std::time::Duration;

pub(crate) fn start_hub(config: HubConfig, max_len: usize) -> EventHub {
    let buffer = Arc::new(EventBuffer::new(max_len, Duration::from_secs(3600)));
    EventHub::start(&config, buffer, Metrics::default())
}
