use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credential: {message} {location}")]
    InvalidCredential {
        message: String,
        location: ErrorLocation,
    },

    #[error("Credential expired {location}")]
    TokenExpired { location: ErrorLocation },

    #[error("Missing credential {location}")]
    MissingCredential { location: ErrorLocation },

    #[error("JWT decode failed: {source} {location}")]
    JwtDecode {
        #[source]
        source: jsonwebtoken::errors::Error,
        location: ErrorLocation,
    },

    #[error("Rate limit exceeded: {limit} messages per second {location}")]
    RateLimitExceeded { limit: u32, location: ErrorLocation },

    #[error("Invalid claim '{claim}': {message} {location}")]
    InvalidClaim {
        claim: String,
        message: String,
        location: ErrorLocation,
    },
}

impl AuthError {
    /// Stable code for logs and HTTP responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidCredential { .. } => "INVALID_CREDENTIAL",
            Self::TokenExpired { .. } => "AUTH_EXPIRED",
            Self::MissingCredential { .. } => "MISSING_CREDENTIAL",
            Self::JwtDecode { .. } => "JWT_DECODE_FAILED",
            Self::RateLimitExceeded { .. } => "RATE_LIMIT_EXCEEDED",
            Self::InvalidClaim { .. } => "INVALID_CLAIM",
        }
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
