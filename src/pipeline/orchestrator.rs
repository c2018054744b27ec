use super::error::PipelineError;
use super::metadata::{write_build_info, write_image_file};
use super::progress::ProgressIndicator;
use super::request::{BuildRequest, ImageIdentity};
use super::state::{PipelineOutcome, PipelineState};
use crate::engine::{BuildOptions, ContainerEngine};
use crate::flatten::{Flattener, MemoryProbe, SystemMemory};
use crate::info::{BuildInfo, BuildInfoResolver};
use crate::tag::sanitize_tag;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(3);

/// Runs one image build from cache warm-up to metadata files
pub struct BuildPipeline {
    engine: Arc<dyn ContainerEngine>,
    resolver: Arc<dyn BuildInfoResolver>,
    memory: Arc<dyn MemoryProbe>,
    info_dir: PathBuf,
    temp_dir: PathBuf,
    progress_interval: Duration,
}

impl BuildPipeline {
    pub fn new(engine: Arc<dyn ContainerEngine>, resolver: Arc<dyn BuildInfoResolver>) -> Self {
        Self {
            engine,
            resolver,
            memory: Arc::new(SystemMemory),
            info_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            temp_dir: std::env::temp_dir(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    pub fn with_memory_probe(mut self, memory: Arc<dyn MemoryProbe>) -> Self {
        self.memory = memory;
        self
    }

    /// Directory receiving `.buildinfo.json`
    pub fn with_info_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.info_dir = dir.into();
        self
    }

    /// Directory for flatten exports buffered on disk
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = dir.into();
        self
    }

    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    pub async fn run(&self, request: &BuildRequest) -> Result<PipelineOutcome, PipelineError> {
        let runtime = &request.default_info.runtime;
        if request.lts_only && !runtime.is_lts {
            info!(
                "Skipping build - runtime version ({}) is not LTS",
                runtime.version
            );
            return Ok(PipelineOutcome::Skipped);
        }

        let start = Instant::now();
        let identity = ImageIdentity::from_request(request);
        info!("Building Docker image '{}'.", identity.final_name);

        let cache_from = self.pull_cache(identity.cache_from.as_deref()).await;

        let state = PipelineState::new(identity.build_name.clone());
        let state = self.build(request, state, cache_from).await?;
        let state = self.flatten(request, &identity, state).await?;
        let state = self.resolve_info(request, state).await?;
        let state = self.tag(request, state).await?;
        let state = self.push(request, state).await?;
        let state = self.write_image_file(request, state).await?;

        debug!(
            image = %state.image_name,
            total_time_ms = start.elapsed().as_millis(),
            "Pipeline complete"
        );

        Ok(PipelineOutcome::Completed {
            image: state.image_name,
            info: state.info.unwrap_or_default(),
        })
    }

    /// Returns the cache reference to build with, or `None` when the pull
    /// failed and the build has to go without one.
    async fn pull_cache(&self, cache_from: Option<&str>) -> Option<String> {
        let reference = cache_from?;
        info!(
            "Attempting to pull image '{}' to use as cache baseline.",
            reference
        );

        match self.engine.pull(reference).await {
            Ok(()) => {
                info!("Pull from '{}' complete.", reference);
                Some(reference.to_string())
            }
            Err(e) => {
                warn!(
                    "Docker failed to pull cache image '{}', building without cache argument: {}",
                    reference, e
                );
                None
            }
        }
    }

    async fn build(
        &self,
        request: &BuildRequest,
        state: PipelineState,
        cache_from: Option<String>,
    ) -> Result<PipelineState, PipelineError> {
        let options = BuildOptions {
            working: request.working_path.clone(),
            file: request.docker_file.clone(),
            args: request.build_args.clone(),
            cache_from,
        };

        let mut progress = ProgressIndicator::start(
            request.progress,
            self.progress_interval,
            format!("Building {}", state.image_name),
        );
        let built = self.engine.build(&state.image_name, &options).await;
        progress.stop();

        match built {
            Ok(()) => {
                info!("Docker image '{}' built successfully.", state.image_name);
                Ok(state)
            }
            Err(source) => {
                error!(
                    "Docker build for image '{}' failed: {}",
                    state.image_name, source
                );
                Err(PipelineError::Build {
                    image: state.image_name,
                    source,
                })
            }
        }
    }

    async fn flatten(
        &self,
        request: &BuildRequest,
        identity: &ImageIdentity,
        mut state: PipelineState,
    ) -> Result<PipelineState, PipelineError> {
        if !request.flatten {
            return Ok(state);
        }

        let flattener = Flattener::new(
            self.engine.clone(),
            self.memory.clone(),
            self.temp_dir.clone(),
        );

        match flattener
            .flatten(&state.image_name, &identity.final_name)
            .await
        {
            Ok(report) => {
                debug!(strategy = %report.strategy, instructions = report.instructions, "Flatten report");
                info!("Image flattened into '{}' successfully.", identity.final_name);
                state.image_name = identity.final_name.clone();
                Ok(state)
            }
            Err(source) => {
                error!(
                    "Flattening image '{}' into '{}' failed: {}",
                    state.image_name, identity.final_name, source
                );
                Err(PipelineError::Flatten {
                    image: state.image_name,
                    final_image: identity.final_name.clone(),
                    source,
                })
            }
        }
    }

    async fn resolve_info(
        &self,
        request: &BuildRequest,
        mut state: PipelineState,
    ) -> Result<PipelineState, PipelineError> {
        let defaults = &request.default_info;

        if request.tag_specs.is_empty() {
            info!("No tags were specified, skipping tag and push.");
            info!(
                "branch - {}, PR - {}, tagged - {}",
                defaults.branch, defaults.ci.pull_request, defaults.ci.tagged
            );
            return Ok(state.halt());
        }

        let resolved = match self
            .resolver
            .resolve(&request.working_path, &request.tag_specs)
            .await
        {
            Ok(info) => info,
            Err(e) => {
                error!(
                    "Failed to acquire and write build information due to error: {}",
                    e
                );
                return Err(PipelineError::info_write(e));
            }
        };

        let mut info = sanitize_info(resolved);
        if info.tag.is_empty() {
            info!("Tag specification resulted in an empty tag set, skipping tag and push.");
            info!(
                "branch - '{}', PR - '{}', tag spec - '{}'",
                defaults.branch,
                defaults.ci.pull_request,
                request.tag_specs.join(",")
            );
            info.should_continue = false;
        } else {
            info.should_continue = true;
        }

        match write_build_info(&self.info_dir, &info).await {
            Ok(path) => debug!(path = %path.display(), "Build information written"),
            Err(e) => {
                error!(
                    "Failed to acquire and write build information due to error: {}",
                    e
                );
                return Err(PipelineError::info_write(e));
            }
        }

        state.info = Some(info);
        Ok(state)
    }

    async fn tag(
        &self,
        request: &BuildRequest,
        state: PipelineState,
    ) -> Result<PipelineState, PipelineError> {
        let pull_request = state.info.as_ref().is_some_and(|i| i.ci.pull_request);

        if (request.skip_prs && pull_request) || !state.should_continue() {
            info!("Skipping tag & push.");
            return Ok(state.halt());
        }

        info!("Tagging image.");
        match self.engine.tag_image(&state.image_name, state.tags()).await {
            Ok(()) => Ok(state),
            Err(source) => {
                let tags = state.tags().join(", ");
                error!(
                    "Tagging image '{}' with tags, '{}', failed with error:\n {}",
                    state.image_name, tags, source
                );
                Err(PipelineError::Tag {
                    image: state.image_name,
                    tags,
                    source,
                })
            }
        }
    }

    async fn push(
        &self,
        request: &BuildRequest,
        state: PipelineState,
    ) -> Result<PipelineState, PipelineError> {
        if !state.should_continue() || request.no_push {
            info!("Skipping push image.");
            return Ok(state);
        }

        info!("Pushing image.");
        match self.engine.push_tags(&state.image_name, state.tags()).await {
            Ok(()) => {
                info!(
                    "Docker image '{}' was pushed successfully with tags: {}",
                    state.image_name,
                    state.tags().join(", ")
                );
                Ok(state)
            }
            Err(source) => {
                error!(
                    "Pushing the image '{}' failed for some or all tags:\n {}",
                    state.image_name, source
                );
                Err(PipelineError::Push {
                    image: state.image_name,
                    source,
                })
            }
        }
    }

    async fn write_image_file(
        &self,
        request: &BuildRequest,
        state: PipelineState,
    ) -> Result<PipelineState, PipelineError> {
        if !state.should_continue() {
            info!("Skipping write of image file information.");
            return Ok(state);
        }

        let path = request.image_file();
        info!("Writing image file to '{}'.", path.display());

        match write_image_file(&path, &state.image_name, state.tags()).await {
            Ok(()) => {
                info!("Image file written to '{}' successfully.", path.display());
                Ok(state)
            }
            Err(e) => {
                error!(
                    "Failed to write image file to '{}' with error: {}",
                    path.display(),
                    e
                );
                Err(PipelineError::ImageFile {
                    path: path.display().to_string(),
                    source: e.into(),
                })
            }
        }
    }
}

/// Sanitizes every resolved tag (dropping empty ones) and the branch name
fn sanitize_info(mut info: BuildInfo) -> BuildInfo {
    info.tag = info
        .tag
        .iter()
        .filter(|t| !t.is_empty())
        .map(|t| sanitize_tag(t))
        .collect();
    info.branch = sanitize_tag(&info.branch);
    info
}
