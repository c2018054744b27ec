//! shipwright - build, tag and publish Docker images from a repository
//!
//! A build runs as a fixed pipeline: warm the build cache, build the image,
//! optionally squash it into a single layer, resolve tags from git and CI
//! metadata, tag, push and record the published image in a JSON file.
//!
//! # Core Concepts
//!
//! - **Container engine**: the [`engine::ContainerEngine`] trait behind every
//!   docker operation, implemented by [`DockerCli`] and [`MockEngine`]
//! - **Tag specification**: short tokens such as `lt` or `v_s` expanded into
//!   concrete tags by a [`info::BuildInfoResolver`]
//! - **Flattening**: exporting a container filesystem and importing it as a
//!   single-layer image, replaying the original image configuration
//!
//! # Example Usage
//!
//! ```no_run
//! use shipwright::{BuildPipeline, BuildRequest, DockerCli, GitInfoResolver};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = BuildPipeline::new(
//!     Arc::new(DockerCli::default()),
//!     Arc::new(GitInfoResolver::default()),
//! );
//!
//! let request = BuildRequest {
//!     tag_specs: vec!["lt".to_string(), "v_s".to_string()],
//!     ..BuildRequest::new("acme", "api")
//! };
//! pipeline.run(&request).await?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod engine;
pub mod flatten;
pub mod info;
pub mod pipeline;
pub mod settings;
pub mod tag;
pub mod util;

pub use config::{ConfigError, ShipwrightConfig};
pub use engine::{ContainerEngine, DockerCli, EngineError, MockEngine};
pub use flatten::{FlattenStrategy, Flattener};
pub use info::{BuildInfo, BuildInfoResolver, GitInfoResolver, StaticInfoResolver};
pub use pipeline::{BuildPipeline, BuildRequest, PipelineError, PipelineOutcome};
pub use tag::sanitize_tag;
pub use util::{config_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
