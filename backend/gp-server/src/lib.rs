pub mod error;
pub mod health;
pub mod job_queues;
pub mod logger;
pub mod pg_store;
pub mod routes;
pub mod server_state;

#[cfg(test)]
mod tests;

pub use error::{Result as ServerErrorResult, ServerError};
pub use job_queues::JobQueues;
pub use pg_store::PgStore;
pub use routes::build_router;
pub use server_state::ServerState;
