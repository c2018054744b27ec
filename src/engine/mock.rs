use super::error::EngineError;
use super::types::{BuildOptions, ExportStream, ImageInspect, ImportSource};
use super::ContainerEngine;
use async_trait::async_trait;
use futures_util::FutureExt;
use std::collections::HashSet;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::io::AsyncReadExt;

/// Engine operations a [`MockEngine`] can be told to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineOp {
    Pull,
    Build,
    Create,
    Export,
    Import,
    Inspect,
    Tag,
    Push,
    RemoveContainer,
}

/// A recorded engine call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Pull(String),
    Build {
        image: String,
        options: BuildOptions,
    },
    Create {
        image: String,
        name: String,
    },
    ExportToFile {
        container: String,
        path: PathBuf,
    },
    ExportStream {
        container: String,
    },
    Import {
        source: ImportedFrom,
        image: String,
        changes: Vec<String>,
    },
    Inspect(String),
    Tag {
        image: String,
        tags: Vec<String>,
    },
    Push {
        image: String,
        tags: Vec<String>,
    },
    RemoveContainer {
        container: String,
        force: bool,
    },
}

impl EngineCall {
    pub fn op(&self) -> EngineOp {
        match self {
            EngineCall::Pull(_) => EngineOp::Pull,
            EngineCall::Build { .. } => EngineOp::Build,
            EngineCall::Create { .. } => EngineOp::Create,
            EngineCall::ExportToFile { .. } | EngineCall::ExportStream { .. } => EngineOp::Export,
            EngineCall::Import { .. } => EngineOp::Import,
            EngineCall::Inspect(_) => EngineOp::Inspect,
            EngineCall::Tag { .. } => EngineOp::Tag,
            EngineCall::Push { .. } => EngineOp::Push,
            EngineCall::RemoveContainer { .. } => EngineOp::RemoveContainer,
        }
    }
}

/// What an import consumed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportedFrom {
    File { path: PathBuf, bytes: usize },
    Stream { bytes: usize },
}

/// In-memory engine that records every call
pub struct MockEngine {
    calls: Mutex<Vec<EngineCall>>,
    failures: Mutex<HashSet<EngineOp>>,
    inspect: ImageInspect,
    export_payload: Vec<u8>,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(HashSet::new()),
            inspect: ImageInspect::default(),
            export_payload: b"mock container filesystem".to_vec(),
        }
    }

    /// Record returned by `inspect`
    pub fn with_inspect(mut self, inspect: ImageInspect) -> Self {
        self.inspect = inspect;
        self
    }

    /// Makes every call of `op` fail
    pub fn fail_on(self, op: EngineOp) -> Self {
        self.failures.lock().unwrap().insert(op);
        self
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, op: EngineOp) -> Vec<EngineCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.op() == op)
            .collect()
    }

    pub fn count(&self, op: EngineOp) -> usize {
        self.calls_to(op).len()
    }

    fn record(&self, call: EngineCall) -> Result<(), EngineError> {
        let op = call.op();
        self.calls.lock().unwrap().push(call);
        if self.failures.lock().unwrap().contains(&op) {
            return Err(EngineError::other(format!("mock {:?} failure", op)));
        }
        Ok(())
    }
}

#[async_trait]
impl ContainerEngine for MockEngine {
    async fn pull(&self, reference: &str) -> Result<(), EngineError> {
        self.record(EngineCall::Pull(reference.to_string()))
    }

    async fn build(&self, image: &str, options: &BuildOptions) -> Result<(), EngineError> {
        self.record(EngineCall::Build {
            image: image.to_string(),
            options: options.clone(),
        })
    }

    async fn create(&self, image: &str, name: &str) -> Result<String, EngineError> {
        self.record(EngineCall::Create {
            image: image.to_string(),
            name: name.to_string(),
        })?;
        Ok(name.to_string())
    }

    async fn export_to_file(&self, container: &str, path: &Path) -> Result<(), EngineError> {
        self.record(EngineCall::ExportToFile {
            container: container.to_string(),
            path: path.to_path_buf(),
        })?;
        tokio::fs::write(path, &self.export_payload).await?;
        Ok(())
    }

    async fn export_stream(&self, container: &str) -> Result<ExportStream, EngineError> {
        self.record(EngineCall::ExportStream {
            container: container.to_string(),
        })?;
        Ok(ExportStream {
            reader: Box::new(Cursor::new(self.export_payload.clone())),
            completion: async { Ok(()) }.boxed(),
        })
    }

    async fn import(
        &self,
        source: ImportSource,
        image: &str,
        changes: &[String],
    ) -> Result<(), EngineError> {
        let imported = match source {
            ImportSource::File(path) => {
                let bytes = tokio::fs::read(&path).await.map(|b| b.len()).unwrap_or(0);
                ImportedFrom::File { path, bytes }
            }
            ImportSource::Stream(mut export) => {
                let mut buf = Vec::new();
                export.reader.read_to_end(&mut buf).await?;
                export.completion.await?;
                ImportedFrom::Stream { bytes: buf.len() }
            }
        };
        self.record(EngineCall::Import {
            source: imported,
            image: image.to_string(),
            changes: changes.to_vec(),
        })
    }

    async fn inspect(&self, image: &str) -> Result<ImageInspect, EngineError> {
        self.record(EngineCall::Inspect(image.to_string()))?;
        Ok(self.inspect.clone())
    }

    async fn tag_image(&self, image: &str, tags: &[String]) -> Result<(), EngineError> {
        self.record(EngineCall::Tag {
            image: image.to_string(),
            tags: tags.to_vec(),
        })
    }

    async fn push_tags(&self, image: &str, tags: &[String]) -> Result<(), EngineError> {
        self.record(EngineCall::Push {
            image: image.to_string(),
            tags: tags.to_vec(),
        })
    }

    async fn remove_container(&self, container: &str, force: bool) -> Result<(), EngineError> {
        self.record(EngineCall::RemoveContainer {
            container: container.to_string(),
            force,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_calls_in_order() {
        let engine = MockEngine::new();
        engine.pull("org/app:latest").await.unwrap();
        engine
            .tag_image("org/app", &["main".to_string()])
            .await
            .unwrap();

        let calls = engine.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], EngineCall::Pull("org/app:latest".to_string()));
        assert_eq!(calls[1].op(), EngineOp::Tag);
    }

    #[tokio::test]
    async fn test_fail_on_still_records_call() {
        let engine = MockEngine::new().fail_on(EngineOp::Push);
        let result = engine.push_tags("org/app", &["main".to_string()]).await;

        assert!(result.is_err());
        assert_eq!(engine.count(EngineOp::Push), 1);
    }

    #[tokio::test]
    async fn test_stream_import_drains_export() {
        let engine = MockEngine::new();
        let export = engine.export_stream("abc").await.unwrap();
        engine
            .import(ImportSource::Stream(export), "org/app", &[])
            .await
            .unwrap();

        let imports = engine.calls_to(EngineOp::Import);
        match &imports[0] {
            EngineCall::Import {
                source: ImportedFrom::Stream { bytes },
                ..
            } => assert!(*bytes > 0),
            other => panic!("unexpected call {:?}", other),
        }
    }
}
