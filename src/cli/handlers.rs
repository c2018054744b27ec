use super::commands::BuildArgs;
use crate::config::ShipwrightConfig;
use crate::engine::DockerCli;
use crate::info::{split_specs, CiContext, DefaultInfo, GitInfoResolver};
use crate::pipeline::{BuildPipeline, BuildRequest, PipelineError, PipelineOutcome};
use crate::settings::{default_name, BranchPolicy};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Exit code for failures before the pipeline starts
pub const COMMAND_FAILURE_EXIT_CODE: i32 = 1;

pub async fn handle_build(args: &BuildArgs, verbose: bool) -> i32 {
    let config = ShipwrightConfig::default();
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        eprintln!("\nPlease check your SHIPWRIGHT_* environment variables.");
        return COMMAND_FAILURE_EXIT_CODE;
    }
    debug!("{}", config);

    let resolver = Arc::new(GitInfoResolver::new(config.git_binary.clone()));

    let request = match prepare_request(args, &config, &resolver).await {
        Ok(request) => request,
        Err(e) => {
            error!("{:#}", e);
            return COMMAND_FAILURE_EXIT_CODE;
        }
    };
    debug!("Build request: {:?}", request);

    let engine = Arc::new(
        DockerCli::new(config.docker_binary.clone())
            .with_sudo(args.sudo)
            .with_verbose(verbose),
    );

    let pipeline =
        BuildPipeline::new(engine, resolver).with_progress_interval(config.progress_interval());

    // A panic inside the pipeline surfaces as a fatal error, not a crash.
    let outcome = tokio::spawn(async move { pipeline.run(&request).await })
        .await
        .unwrap_or_else(|e| Err(PipelineError::from(e)));

    match outcome {
        Ok(PipelineOutcome::Completed { image, info }) => {
            debug!(image = %image, tags = %info.tag_list(), "Build finished");
            0
        }
        Ok(PipelineOutcome::Skipped) => 0,
        Err(e) => {
            debug!("Pipeline error: {:?}", e);
            error!("shipwright failed - exiting");
            e.exit_code()
        }
    }
}

/// Turns command-line arguments into a [`BuildRequest`], filling in the
/// image name and tag specs the user left out
pub async fn prepare_request(
    args: &BuildArgs,
    config: &ShipwrightConfig,
    resolver: &GitInfoResolver,
) -> Result<BuildRequest> {
    let working_path = args.working_path.canonicalize().with_context(|| {
        format!(
            "Failed to resolve working path '{}'",
            args.working_path.display()
        )
    })?;
    if !working_path.is_dir() {
        anyhow::bail!(
            "Working path is not a directory: {}",
            working_path.display()
        );
    }
    debug!("Canonicalized working path: {}", working_path.display());

    let docker_file = resolve_docker_file(&args.docker_file, &working_path);

    let name = match &args.name {
        Some(name) => name.clone(),
        None => default_name(&working_path)
            .context("Could not derive an image name from the working path, pass --name")?,
    };

    let default_info = match resolver.default_info(&working_path, config.runtime()).await {
        Ok(info) => info,
        Err(e) => {
            warn!("Could not determine the current branch: {}", e);
            DefaultInfo {
                branch: String::new(),
                ci: CiContext::from_env(),
                runtime: config.runtime(),
            }
        }
    };

    let tag_specs = if args.tags.is_empty() {
        let policy = BranchPolicy::new(config.default_branch.clone())
            .with_build_branches(args.build_branches.clone())
            .with_always_build(args.always_build);
        let specs = policy.default_tag_specs(&default_info.branch);
        info!(
            "No tag specification given, using defaults for branch '{}': [{}]",
            default_info.branch,
            specs.join(", ")
        );
        specs
    } else {
        split_specs(args.tags.as_slice())
    };

    Ok(BuildRequest {
        repo: args.repo.clone(),
        name,
        working_path,
        docker_file,
        name_prefix: args.name_prefix.clone(),
        name_postfix: args.name_postfix.clone(),
        registry: Some(args.registry.clone()),
        output: args.output.clone(),
        build_args: args.build_args.iter().cloned().collect(),
        tag_specs,
        skip_prs: args.skip_prs,
        lts_only: args.lts_only,
        no_push: args.no_push,
        flatten: args.flatten,
        cache_from: args.cache_from.clone(),
        cache_from_latest: args.cache_from_latest,
        progress: args.progress,
        default_info,
    })
}

/// A relative build file is taken from the current directory when it exists
/// there, otherwise from the working path
fn resolve_docker_file(docker_file: &Path, working_path: &Path) -> PathBuf {
    if docker_file.is_absolute() || docker_file.exists() {
        docker_file.to_path_buf()
    } else {
        working_path.join(docker_file)
    }
}
