//! JSON text frames exchanged with clients.

use crate::{Event, Result as WsErrorResult};

use std::sync::Arc;

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

/// Frame type sent when a replay request cannot be honoured
pub const RESET_TYPE: &str = "reset";
/// Frame type sent to every connection before the hub closes it
pub const SHUTDOWN_TYPE: &str = "shutdown";

/// Client to server messages. Anything that does not parse is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Subscribe {
        #[serde(default)]
        last_event_id: u64,
    },
}

#[derive(Serialize)]
struct EventEnvelope<'a> {
    #[serde(rename = "type")]
    event_type: &'a str,
    id: u64,
    data: &'a RawValue,
    time: String,
}

#[derive(Serialize)]
struct ResetFrame<'a> {
    #[serde(rename = "type")]
    frame_type: &'static str,
    reason: &'a str,
}

#[derive(Serialize)]
struct ShutdownFrame<'a> {
    #[serde(rename = "type")]
    frame_type: &'static str,
    message: &'a str,
}

/// Encode an event as `{"type","id","data","time"}` with `data` embedded raw
pub fn encode_event(event: &Event) -> WsErrorResult<Arc<str>> {
    let data: &RawValue = serde_json::from_slice(&event.data)?;

    let envelope = EventEnvelope {
        event_type: &event.event_type,
        id: event.id,
        data,
        time: event.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
    };

    Ok(Arc::from(serde_json::to_string(&envelope)?))
}

pub fn reset_frame(reason: &str) -> Arc<str> {
    encode_control(&ResetFrame {
        frame_type: RESET_TYPE,
        reason,
    })
}

pub fn shutdown_frame(message: &str) -> Arc<str> {
    encode_control(&ShutdownFrame {
        frame_type: SHUTDOWN_TYPE,
        message,
    })
}

pub fn decode_client_message(text: &str) -> Option<ClientMessage> {
    serde_json::from_str(text).ok()
}

fn encode_control<T: Serialize>(frame: &T) -> Arc<str> {
    // Plain string fields cannot fail to serialize.
    Arc::from(serde_json::to_string(frame).unwrap_or_default())
}
