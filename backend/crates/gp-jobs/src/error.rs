use crate::BreakerError;

use std::panic::Location;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum JobError {
    #[error("{pool} queue full, job dropped {location}")]
    QueueFull {
        pool: &'static str,
        location: ErrorLocation,
    },

    #[error("{pool} pool stopped {location}")]
    PoolStopped {
        pool: &'static str,
        location: ErrorLocation,
    },

    #[error("Circuit breaker open {location}")]
    BreakerOpen { location: ErrorLocation },

    #[error("Embedding backend error: {message} {location}")]
    Backend {
        message: String,
        location: ErrorLocation,
    },

    #[error("HTTP request failed: {source} {location}")]
    Http {
        #[source]
        source: reqwest::Error,
        location: ErrorLocation,
    },

    #[error("Invalid embedding endpoint '{endpoint}': {message} {location}")]
    InvalidEndpoint {
        endpoint: String,
        message: String,
        location: ErrorLocation,
    },

    #[error("Embedding host '{host}' is not a loopback address {location}")]
    NonLoopbackHost {
        host: String,
        location: ErrorLocation,
    },

    #[error("Persistence failed: {message} {location}")]
    Persistence {
        message: String,
        location: ErrorLocation,
    },

    #[error("Job cancelled {location}")]
    Cancelled { location: ErrorLocation },
}

impl JobError {
    #[track_caller]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<reqwest::Error> for JobError {
    #[track_caller]
    fn from(source: reqwest::Error) -> Self {
        Self::Http {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<BreakerError<JobError>> for JobError {
    #[track_caller]
    fn from(error: BreakerError<JobError>) -> Self {
        match error {
            BreakerError::Open => Self::BreakerOpen {
                location: ErrorLocation::from(Location::caller()),
            },
            BreakerError::Inner(inner) => inner,
        }
    }
}

pub type Result<T> = std::result::Result<T, JobError>;
