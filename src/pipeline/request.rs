use crate::info::DefaultInfo;
use crate::tag::sanitize_tag;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Build target used in place of the final name while flattening
pub const TEMPORARY_IMAGE: &str = "temp";

pub const DEFAULT_OUTPUT_FILE: &str = ".image.json";

const DOCKER_HUB_HOSTS: &[&str] = &[
    "https://hub.docker.com",
    "hub.docker.com",
    "docker.io",
    "https://index.docker.io/v1/",
];

/// Everything one pipeline run needs to know; immutable for the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    pub repo: String,
    pub name: String,
    pub working_path: PathBuf,
    pub docker_file: PathBuf,
    pub name_prefix: Option<String>,
    pub name_postfix: Option<String>,
    pub registry: Option<String>,
    /// Image metadata file, relative to `working_path`
    pub output: PathBuf,
    pub build_args: BTreeMap<String, String>,
    pub tag_specs: Vec<String>,
    pub skip_prs: bool,
    pub lts_only: bool,
    pub no_push: bool,
    pub flatten: bool,
    pub cache_from: Option<String>,
    pub cache_from_latest: bool,
    pub progress: bool,
    pub default_info: DefaultInfo,
}

impl BuildRequest {
    pub fn new(repo: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            name: name.into(),
            working_path: PathBuf::from("."),
            docker_file: PathBuf::from("Dockerfile"),
            name_prefix: None,
            name_postfix: None,
            registry: None,
            output: PathBuf::from(DEFAULT_OUTPUT_FILE),
            build_args: BTreeMap::new(),
            tag_specs: Vec::new(),
            skip_prs: true,
            lts_only: true,
            no_push: false,
            flatten: false,
            cache_from: None,
            cache_from_latest: false,
            progress: false,
            default_info: DefaultInfo::default(),
        }
    }

    pub fn image_file(&self) -> PathBuf {
        self.working_path.join(&self.output)
    }
}

/// Names derived from a [`BuildRequest`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageIdentity {
    /// Fully-qualified published name
    pub final_name: String,
    /// Name the build step produces: the temporary name when flattening
    pub build_name: String,
    /// Image pulled to seed the build cache
    pub cache_from: Option<String>,
}

impl ImageIdentity {
    pub fn from_request(request: &BuildRequest) -> Self {
        let base_image = format!(
            "{}{}{}",
            request.name_prefix.as_deref().unwrap_or_default(),
            sanitize_tag(&request.name),
            request.name_postfix.as_deref().unwrap_or_default()
        );

        let mut parts = Vec::with_capacity(3);
        if let Some(registry) = request.registry.as_deref() {
            if !is_default_registry(registry) {
                parts.push(registry.trim_end_matches('/'));
            }
        }
        parts.push(request.repo.as_str());
        parts.push(base_image.as_str());
        let final_name = parts.join("/");

        let build_name = if request.flatten {
            TEMPORARY_IMAGE.to_string()
        } else {
            final_name.clone()
        };

        let cache_from = if request.cache_from_latest {
            Some(format!("{}:latest", final_name))
        } else {
            request.cache_from.clone().filter(|c| !c.is_empty())
        };

        Self {
            final_name,
            build_name,
            cache_from,
        }
    }
}

fn is_default_registry(registry: &str) -> bool {
    registry.is_empty() || DOCKER_HUB_HOSTS.contains(&registry)
}
