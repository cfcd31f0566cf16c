use proximity_scheduler::ConfigError;
use thiserror::Error;

/// Errors that can occur starting or talking to the proximity service
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration rejected before anything started
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Worker thread or its tokio runtime could not be created
    #[error("Failed to start scheduler worker: {0}")]
    RuntimeInit(String),

    /// The control loop has stopped and no longer accepts observations
    #[error("Observation channel has been closed")]
    ChannelClosed,

    /// The worker thread panicked before it could stop cleanly
    #[error("Scheduler worker panicked")]
    WorkerPanicked,
}

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;
