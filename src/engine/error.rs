use thiserror::Error;

/// Errors raised by a container engine call
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {message}")]
    CommandFailed {
        command: String,
        status: String,
        message: String,
    },

    #[error("Invalid inspect output for '{image}': {message}")]
    InvalidInspect { image: String, message: String },

    #[error("Stream error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl EngineError {
    pub fn other(message: impl Into<String>) -> Self {
        EngineError::Other(message.into())
    }
}
