use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Config error: {0}")]
    Config(#[from] gp_config::ConfigError),

    #[error("Change feed error: {0}")]
    Feed(#[from] gp_feed::FeedError),

    #[error("Job pipeline error: {0}")]
    Jobs(#[from] gp_jobs::JobError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to install metrics exporter: {message}")]
    Metrics { message: String },

    #[error("Logger error: {message}")]
    Logger { message: String },
}

pub type Result<T> = std::result::Result<T, ServerError>;
