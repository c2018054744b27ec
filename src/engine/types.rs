use super::error::EngineError;
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use tokio::io::AsyncRead;

/// Image record as reported by `docker image inspect`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImageInspect {
    #[serde(default)]
    pub id: String,

    /// Image size in bytes
    #[serde(default)]
    pub size: u64,

    #[serde(default)]
    pub config: Option<ImageConfig>,
}

/// Runtime configuration carried by an image
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImageConfig {
    #[serde(default)]
    pub user: Option<String>,

    #[serde(default)]
    pub working_dir: Option<String>,

    #[serde(default)]
    pub env: Option<Vec<String>>,

    #[serde(default)]
    pub exposed_ports: Option<BTreeMap<String, serde_json::Value>>,

    #[serde(default)]
    pub cmd: Option<Vec<String>>,

    #[serde(default)]
    pub entrypoint: Option<Vec<String>>,
}

/// Arguments for an image build
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOptions {
    pub working: PathBuf,
    pub file: PathBuf,
    pub args: BTreeMap<String, String>,
    pub cache_from: Option<String>,
}

/// A container filesystem export in flight.
///
/// `completion` resolves once the producer has finished and reports whether
/// the export itself succeeded; it must be awaited after `reader` is drained.
pub struct ExportStream {
    pub reader: Box<dyn AsyncRead + Send + Unpin>,
    pub completion: BoxFuture<'static, Result<(), EngineError>>,
}

impl fmt::Debug for ExportStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportStream").finish_non_exhaustive()
    }
}

/// Where an import reads the filesystem archive from
#[derive(Debug)]
pub enum ImportSource {
    File(PathBuf),
    Stream(ExportStream),
}

impl ImportSource {
    pub fn describe(&self) -> String {
        match self {
            ImportSource::File(path) => format!("file '{}'", path.display()),
            ImportSource::Stream(_) => "pipe".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inspect_deserializes_docker_output() {
        let raw = r#"{
            "Id": "sha256:abc",
            "Size": 123456,
            "Config": {
                "User": "node",
                "WorkingDir": "/app",
                "Env": ["PATH=/usr/bin", "NODE_ENV=production"],
                "ExposedPorts": {"8080/tcp": {}},
                "Cmd": ["node", "index.js"],
                "Entrypoint": null
            }
        }"#;

        let inspect: ImageInspect = serde_json::from_str(raw).unwrap();
        assert_eq!(inspect.id, "sha256:abc");
        assert_eq!(inspect.size, 123_456);

        let config = inspect.config.unwrap();
        assert_eq!(config.user.as_deref(), Some("node"));
        assert_eq!(config.working_dir.as_deref(), Some("/app"));
        assert_eq!(config.env.unwrap().len(), 2);
        assert!(config.exposed_ports.unwrap().contains_key("8080/tcp"));
        assert_eq!(config.cmd.unwrap(), vec!["node", "index.js"]);
        assert!(config.entrypoint.is_none());
    }

    #[test]
    fn test_inspect_tolerates_null_config() {
        let inspect: ImageInspect = serde_json::from_str(r#"{"Size": 1, "Config": null}"#).unwrap();
        assert!(inspect.config.is_none());
    }

    #[test]
    fn test_import_source_describe() {
        let source = ImportSource::File(PathBuf::from("/tmp/x.tar"));
        assert_eq!(source.describe(), "file '/tmp/x.tar'");
    }
}
