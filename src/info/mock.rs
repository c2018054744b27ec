use super::resolver::{BuildInfoResolver, ResolveError};
use super::types::BuildInfo;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Resolver that returns a fixed [`BuildInfo`] and records its calls
pub struct StaticInfoResolver {
    info: BuildInfo,
    fail: bool,
    calls: Mutex<Vec<(PathBuf, Vec<String>)>>,
}

impl StaticInfoResolver {
    pub fn new(info: BuildInfo) -> Self {
        Self {
            info,
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Resolver whose every call fails
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(BuildInfo::default())
        }
    }

    pub fn calls(&self) -> Vec<(PathBuf, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BuildInfoResolver for StaticInfoResolver {
    async fn resolve(
        &self,
        working_path: &Path,
        tag_specs: &[String],
    ) -> Result<BuildInfo, ResolveError> {
        self.calls
            .lock()
            .unwrap()
            .push((working_path.to_path_buf(), tag_specs.to_vec()));

        if self.fail {
            return Err(ResolveError::Other("mock resolver failure".to_string()));
        }
        Ok(self.info.clone())
    }
}
