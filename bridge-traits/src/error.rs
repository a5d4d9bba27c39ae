use thiserror::Error;

/// Failures reported by host-side executors and sinks.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Failed to start host thread: {0}")]
    ThreadSpawn(#[from] std::io::Error),

    #[error("Event loop '{name}' is already owned by another thread")]
    AlreadyOwned { name: String },

    #[error("Host thread '{name}' exited before it was ready")]
    ThreadExited { name: String },

    #[error("Log sink rejected entry: {0}")]
    Sink(String),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
