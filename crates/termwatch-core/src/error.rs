//! Error types for termwatch.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TermwatchError {
    #[error("No tokio runtime available to drive session timers")]
    NoRuntime,

    #[error("Dispatcher worker has shut down")]
    DispatcherClosed,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Search query cannot be empty")]
    EmptyQuery,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
