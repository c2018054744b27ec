//! Image flattening
//!
//! Collapses a freshly built multi-layer image into a single layer by
//! exporting a throwaway container's filesystem and importing it under the
//! final image name. The image's runtime configuration is carried over as
//! commit instructions (see [`changes`]). Whether the export is buffered on
//! disk or piped straight through is decided by [`FlattenStrategy::select`]
//! from the image size and the free memory reported by a [`MemoryProbe`].

pub mod changes;
pub mod memory;
pub mod strategy;

pub use changes::CommitInstructions;
pub use memory::{FixedMemory, MemoryProbe, SystemMemory};
pub use strategy::{flatten_by_disk, flatten_by_stream, FlattenJob, FlattenStrategy};

use crate::engine::{ContainerEngine, EngineError};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

const MB: f64 = 1_048_576.0;

/// Outcome of a flatten run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenReport {
    pub strategy: FlattenStrategy,
    pub image_size: u64,
    pub free_memory: u64,
    pub instructions: usize,
}

pub struct Flattener {
    engine: Arc<dyn ContainerEngine>,
    memory: Arc<dyn MemoryProbe>,
    temp_dir: PathBuf,
}

impl Flattener {
    pub fn new(
        engine: Arc<dyn ContainerEngine>,
        memory: Arc<dyn MemoryProbe>,
        temp_dir: PathBuf,
    ) -> Self {
        Self {
            engine,
            memory,
            temp_dir,
        }
    }

    /// Flattens `<initial_image>:latest` into `final_image`.
    pub async fn flatten(
        &self,
        initial_image: &str,
        final_image: &str,
    ) -> Result<FlattenReport, EngineError> {
        let source_tag = format!("{}:latest", initial_image);
        let container_name = throwaway_container_name();

        let inspect = self.engine.inspect(&source_tag).await?;
        let changes = CommitInstructions::from_inspect(&inspect);

        info!(
            "Flattening temporary image '{}' into '{}'.",
            initial_image, final_image
        );

        let free_memory = self.memory.free_bytes();
        let strategy = FlattenStrategy::select(changes.size_bytes, free_memory);
        info!(
            strategy = %strategy,
            "image size {:.2} MB, free memory {:.2} MB",
            changes.size_bytes as f64 / MB,
            free_memory as f64 / MB
        );

        let job = FlattenJob {
            container_name: &container_name,
            source_tag: &source_tag,
            final_image,
            changes: changes.as_slice(),
        };

        match strategy {
            FlattenStrategy::Disk => {
                flatten_by_disk(self.engine.as_ref(), &job, &self.temp_dir).await?
            }
            FlattenStrategy::Stream => flatten_by_stream(self.engine.as_ref(), &job).await?,
        }

        Ok(FlattenReport {
            strategy,
            image_size: changes.size_bytes,
            free_memory,
            instructions: changes.len(),
        })
    }
}

/// Short random container name: the last group of a v4 UUID
fn throwaway_container_name() -> String {
    let id = uuid::Uuid::new_v4().to_string();
    id.rsplit('-').next().unwrap_or(&id).to_string()
}
