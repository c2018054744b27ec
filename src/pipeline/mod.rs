//! Build, flatten, tag, push and record one container image.
//!
//! [`BuildPipeline`] drives the steps in a fixed order. Each step receives
//! the [`PipelineState`] produced by the previous one; once build info says
//! not to continue, the remaining steps log and pass the state through.

pub mod error;
pub mod metadata;
pub mod orchestrator;
pub mod progress;
pub mod request;
pub mod state;

pub use error::{PipelineError, FATAL_EXIT_CODE};
pub use metadata::{write_build_info, write_image_file, ImageFile, BUILD_INFO_FILE};
pub use orchestrator::{BuildPipeline, DEFAULT_PROGRESS_INTERVAL};
pub use progress::ProgressIndicator;
pub use request::{BuildRequest, ImageIdentity, DEFAULT_OUTPUT_FILE, TEMPORARY_IMAGE};
pub use state::{PipelineOutcome, PipelineState};
