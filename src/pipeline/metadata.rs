//! Files persisted by a pipeline run

use crate::info::BuildInfo;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

pub const BUILD_INFO_FILE: &str = ".buildinfo.json";

/// Contents of the image metadata file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageFile {
    pub image: String,
    pub tags: Vec<String>,
}

/// Writes `info` as pretty JSON to `<dir>/.buildinfo.json`
pub async fn write_build_info(dir: &Path, info: &BuildInfo) -> io::Result<PathBuf> {
    let path = dir.join(BUILD_INFO_FILE);
    let json = serde_json::to_string_pretty(info)?;
    tokio::fs::write(&path, json).await?;
    Ok(path)
}

/// Writes the compact image metadata JSON to `path`
pub async fn write_image_file(path: &Path, image: &str, tags: &[String]) -> io::Result<()> {
    let json = serde_json::to_string(&ImageFile {
        image: image.to_string(),
        tags: tags.to_vec(),
    })?;
    tokio::fs::write(path, json).await
}
