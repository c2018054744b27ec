use crate::engine::EngineError;
use thiserror::Error;

/// Process exit code for any fatal pipeline failure
pub const FATAL_EXIT_CODE: i32 = 100;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Fatal pipeline failures. A failed cache pull is not among them: it is
/// logged and the build proceeds without a cache reference.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Docker build for image '{image}' failed: {source}")]
    Build {
        image: String,
        #[source]
        source: EngineError,
    },

    #[error("Flattening '{image}' into '{final_image}' failed: {source}")]
    Flatten {
        image: String,
        final_image: String,
        #[source]
        source: EngineError,
    },

    #[error("Failed to acquire and write build information: {source}")]
    InfoWrite {
        #[source]
        source: BoxError,
    },

    #[error("Tagging image '{image}' with tags '{tags}' failed: {source}")]
    Tag {
        image: String,
        tags: String,
        #[source]
        source: EngineError,
    },

    #[error("Pushing the image '{image}' failed for some or all tags: {source}")]
    Push {
        image: String,
        #[source]
        source: EngineError,
    },

    #[error("Failed to write image file to '{path}': {source}")]
    ImageFile {
        path: String,
        #[source]
        source: BoxError,
    },

    #[error("{0}")]
    Generic(String),
}

impl PipelineError {
    pub fn info_write(source: impl Into<BoxError>) -> Self {
        PipelineError::InfoWrite {
            source: source.into(),
        }
    }

    pub fn exit_code(&self) -> i32 {
        FATAL_EXIT_CODE
    }
}

impl From<tokio::task::JoinError> for PipelineError {
    fn from(e: tokio::task::JoinError) -> Self {
        PipelineError::Generic(format!("Pipeline task aborted: {}", e))
    }
}
