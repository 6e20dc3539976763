pub mod claims;
pub mod connection_rate_limiter;
pub mod credential_validator;
pub mod error;
pub mod jwt_validator;

pub use claims::Claims;
pub use connection_rate_limiter::ConnectionRateLimiter;
pub use credential_validator::CredentialValidator;
pub use error::{AuthError, Result};
pub use jwt_validator::JwtValidator;
