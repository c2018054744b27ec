//! Container engine abstraction
//!
//! The pipeline only talks to the engine through [`ContainerEngine`]. The
//! shipped implementation drives the `docker` binary; [`MockEngine`] records
//! calls in memory for tests.

pub mod docker;
pub mod error;
pub mod mock;
pub mod types;

pub use docker::DockerCli;
pub use error::EngineError;
pub use mock::{EngineCall, EngineOp, ImportedFrom, MockEngine};
pub use types::{BuildOptions, ExportStream, ImageConfig, ImageInspect, ImportSource};

use async_trait::async_trait;
use std::path::Path;

/// Operations the build pipeline needs from a container engine
#[async_trait]
pub trait ContainerEngine: Send + Sync {
    async fn pull(&self, reference: &str) -> Result<(), EngineError>;

    async fn build(&self, image: &str, options: &BuildOptions) -> Result<(), EngineError>;

    /// Creates a stopped container named `name` and returns its handle
    async fn create(&self, image: &str, name: &str) -> Result<String, EngineError>;

    async fn export_to_file(&self, container: &str, path: &Path) -> Result<(), EngineError>;

    async fn export_stream(&self, container: &str) -> Result<ExportStream, EngineError>;

    /// Imports a filesystem archive as `image`, applying commit instructions
    async fn import(
        &self,
        source: ImportSource,
        image: &str,
        changes: &[String],
    ) -> Result<(), EngineError>;

    async fn inspect(&self, image: &str) -> Result<ImageInspect, EngineError>;

    /// Applies every tag in `tags` to `image`
    async fn tag_image(&self, image: &str, tags: &[String]) -> Result<(), EngineError>;

    /// Pushes `image` under every tag in `tags`
    async fn push_tags(&self, image: &str, tags: &[String]) -> Result<(), EngineError>;

    async fn remove_container(&self, container: &str, force: bool) -> Result<(), EngineError>;
}
