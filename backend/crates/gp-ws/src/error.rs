use std::panic::Location;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WsError {
    #[error("Admission rejected: {reason} {location}")]
    AdmissionRejected {
        reason: String,
        location: ErrorLocation,
    },

    #[error("Payload too large: {size} bytes (max: {max}) {location}")]
    PayloadTooLarge {
        size: usize,
        max: usize,
        location: ErrorLocation,
    },

    #[error("Queue full: {queue} {location}")]
    QueueFull {
        queue: &'static str,
        location: ErrorLocation,
    },

    #[error("Event serialization failed: {source} {location}")]
    SerializationFailure {
        #[source]
        source: serde_json::Error,
        location: ErrorLocation,
    },

    #[error("Replay from {last_event_id} refused, oldest retained is {oldest_id} {location}")]
    ReplayTooOld {
        last_event_id: u64,
        oldest_id: u64,
        location: ErrorLocation,
    },

    #[error("Event hub stopped {location}")]
    HubStopped { location: ErrorLocation },
}

impl WsError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AdmissionRejected { .. } => "ADMISSION_REJECTED",
            Self::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            Self::QueueFull { .. } => "QUEUE_FULL",
            Self::SerializationFailure { .. } => "SERIALIZATION_FAILURE",
            Self::ReplayTooOld { .. } => "REPLAY_TOO_OLD",
            Self::HubStopped { .. } => "HUB_STOPPED",
        }
    }
}

impl From<serde_json::Error> for WsError {
    #[track_caller]
    fn from(source: serde_json::Error) -> Self {
        Self::SerializationFailure {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type Result<T> = std::result::Result<T, WsError>;
