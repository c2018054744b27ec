use crate::engine::{ContainerEngine, EngineError, ImportSource};
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Streaming keeps the whole export resident; beyond this ratio of image
/// size to free memory the export goes through a temporary file instead.
const MEMORY_HEADROOM_FACTOR: u64 = 10;

/// Mechanism used to collapse an image into a single layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlattenStrategy {
    /// Export to a temporary file, then import the file
    Disk,
    /// Pipe the export straight into the import
    Stream,
}

impl FlattenStrategy {
    pub fn select(image_size: u64, free_memory: u64) -> Self {
        if image_size.saturating_mul(MEMORY_HEADROOM_FACTOR) > free_memory {
            FlattenStrategy::Disk
        } else {
            FlattenStrategy::Stream
        }
    }
}

impl fmt::Display for FlattenStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlattenStrategy::Disk => write!(f, "disk"),
            FlattenStrategy::Stream => write!(f, "stream"),
        }
    }
}

/// One flatten run: which container to create, from what, into what
#[derive(Debug, Clone)]
pub struct FlattenJob<'a> {
    pub container_name: &'a str,
    pub source_tag: &'a str,
    pub final_image: &'a str,
    pub changes: &'a [String],
}

pub fn export_file_path(temp_dir: &Path, container_name: &str) -> PathBuf {
    temp_dir.join(format!("{}-container.tar", container_name))
}

/// Flattens through a temporary file in `temp_dir`.
///
/// The temporary file and the throwaway container are released even when
/// the export or import fails.
pub async fn flatten_by_disk(
    engine: &dyn ContainerEngine,
    job: &FlattenJob<'_>,
    temp_dir: &Path,
) -> Result<(), EngineError> {
    let container = engine.create(job.source_tag, job.container_name).await?;
    let file = export_file_path(temp_dir, job.container_name);
    info!(file = %file.display(), "Exporting container to file");

    let result = async {
        engine.export_to_file(&container, &file).await?;
        engine
            .import(ImportSource::File(file.clone()), job.final_image, job.changes)
            .await
    }
    .await;

    let removed_file = remove_export_file(&file).await;
    let removed_container = engine.remove_container(&container, true).await;

    result?;
    removed_file?;
    removed_container
}

/// Flattens by piping the container export directly into the import.
pub async fn flatten_by_stream(
    engine: &dyn ContainerEngine,
    job: &FlattenJob<'_>,
) -> Result<(), EngineError> {
    let container = engine.create(job.source_tag, job.container_name).await?;
    info!("Exporting container via pipe");

    let result = async {
        let export = engine.export_stream(&container).await?;
        engine
            .import(ImportSource::Stream(export), job.final_image, job.changes)
            .await
    }
    .await;

    let removed_container = engine.remove_container(&container, true).await;

    result?;
    removed_container
}

async fn remove_export_file(file: &Path) -> Result<(), EngineError> {
    match tokio::fs::remove_file(file).await {
        Ok(()) => {
            debug!(file = %file.display(), "Removed container export");
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => {
            warn!(file = %file.display(), error = %e, "Failed to remove container export");
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineCall, EngineOp, ImportedFrom, MockEngine};
    use tempfile::TempDir;
    use yare::parameterized;

    #[parameterized(
        large_image_low_memory = { 5_000_000_000, 400_000_000, FlattenStrategy::Disk },
        small_image_plenty_memory = { 10_000_000, 8_000_000_000, FlattenStrategy::Stream },
        exactly_at_threshold = { 100, 1_000, FlattenStrategy::Stream },
        just_over_threshold = { 101, 1_000, FlattenStrategy::Disk },
        no_free_memory = { 1, 0, FlattenStrategy::Disk },
        empty_image = { 0, 0, FlattenStrategy::Stream },
        overflowing_size = { u64::MAX, u64::MAX, FlattenStrategy::Stream },
    )]
    fn test_select(size: u64, free: u64, expected: FlattenStrategy) {
        assert_eq!(FlattenStrategy::select(size, free), expected);
    }

    fn job<'a>(changes: &'a [String]) -> FlattenJob<'a> {
        FlattenJob {
            container_name: "a1b2c3d4e5f6",
            source_tag: "temp:latest",
            final_image: "org/app",
            changes,
        }
    }

    #[tokio::test]
    async fn test_disk_flatten_sequence_and_cleanup() {
        let temp = TempDir::new().unwrap();
        let engine = MockEngine::new();
        let changes = vec!["USER node".to_string()];

        flatten_by_disk(&engine, &job(&changes), temp.path())
            .await
            .unwrap();

        let file = export_file_path(temp.path(), "a1b2c3d4e5f6");
        let ops: Vec<EngineOp> = engine.calls().iter().map(|c| c.op()).collect();
        assert_eq!(
            ops,
            vec![
                EngineOp::Create,
                EngineOp::Export,
                EngineOp::Import,
                EngineOp::RemoveContainer
            ]
        );
        match &engine.calls_to(EngineOp::Import)[0] {
            EngineCall::Import {
                source: ImportedFrom::File { path, bytes },
                image,
                changes: applied,
            } => {
                assert_eq!(path, &file);
                assert!(*bytes > 0);
                assert_eq!(image, "org/app");
                assert_eq!(applied, &changes);
            }
            other => panic!("unexpected import {:?}", other),
        }
        assert!(!file.exists());
    }

    #[tokio::test]
    async fn test_disk_flatten_cleans_up_after_import_failure() {
        let temp = TempDir::new().unwrap();
        let engine = MockEngine::new().fail_on(EngineOp::Import);

        let result = flatten_by_disk(&engine, &job(&[]), temp.path()).await;

        assert!(result.is_err());
        assert!(!export_file_path(temp.path(), "a1b2c3d4e5f6").exists());
        assert_eq!(
            engine.calls_to(EngineOp::RemoveContainer),
            vec![EngineCall::RemoveContainer {
                container: "a1b2c3d4e5f6".to_string(),
                force: true
            }]
        );
    }

    #[tokio::test]
    async fn test_create_failure_skips_cleanup() {
        let temp = TempDir::new().unwrap();
        let engine = MockEngine::new().fail_on(EngineOp::Create);

        let result = flatten_by_disk(&engine, &job(&[]), temp.path()).await;

        assert!(result.is_err());
        assert_eq!(engine.count(EngineOp::RemoveContainer), 0);
        assert_eq!(engine.count(EngineOp::Export), 0);
    }

    #[tokio::test]
    async fn test_stream_flatten_pipes_export_into_import() {
        let engine = MockEngine::new();
        let changes = vec!["WORKDIR /app".to_string()];

        flatten_by_stream(&engine, &job(&changes)).await.unwrap();

        let calls = engine.calls();
        assert_eq!(
            calls[1],
            EngineCall::ExportStream {
                container: "a1b2c3d4e5f6".to_string()
            }
        );
        assert!(matches!(
            calls[2],
            EngineCall::Import {
                source: ImportedFrom::Stream { .. },
                ..
            }
        ));
        assert_eq!(calls[3].op(), EngineOp::RemoveContainer);
    }

    #[tokio::test]
    async fn test_stream_flatten_removes_container_after_export_failure() {
        let engine = MockEngine::new().fail_on(EngineOp::Export);

        let result = flatten_by_stream(&engine, &job(&[])).await;

        assert!(result.is_err());
        assert_eq!(engine.count(EngineOp::Import), 0);
        assert_eq!(engine.count(EngineOp::RemoveContainer), 1);
    }
}
