use std::panic::Location;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Invalid channel name '{channel}': {message} {location}")]
    InvalidChannel {
        channel: String,
        message: String,
        location: ErrorLocation,
    },

    #[error("Database unreachable: {message} {location}")]
    Unreachable {
        message: String,
        location: ErrorLocation,
    },

    #[error("Listener connection lost: {message} {location}")]
    ConnectionLost {
        message: String,
        location: ErrorLocation,
    },

    #[error("Invalid notification payload: {message} {location}")]
    InvalidPayload {
        message: String,
        location: ErrorLocation,
    },

    #[error("Database error: {source} {location}")]
    Database {
        #[source]
        source: sqlx::Error,
        location: ErrorLocation,
    },
}

impl FeedError {
    #[track_caller]
    pub fn invalid_channel(channel: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidChannel {
            channel: channel.into(),
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::Unreachable {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn connection_lost(message: impl Into<String>) -> Self {
        Self::ConnectionLost {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::InvalidPayload {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<sqlx::Error> for FeedError {
    #[track_caller]
    fn from(source: sqlx::Error) -> Self {
        Self::Database {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type Result<T> = std::result::Result<T, FeedError>;
