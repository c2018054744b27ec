use crate::config::ShipwrightConfig;
use crate::pipeline::DEFAULT_OUTPUT_FILE;
use crate::settings::{DEFAULT_DOCKER_FILE, DEFAULT_WORKING_PATH};
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

pub const DEFAULT_REGISTRY: &str = "hub.docker.com";

/// Build, tag and push Docker images from a repository
#[derive(Parser, Debug)]
#[command(
    name = "shipwright",
    about = "Build, tag and push Docker images with tags derived from git",
    version,
    author,
    long_about = "shipwright builds a Docker image for a repository, optionally flattens it \
                  into a single layer, tags it from a tag specification resolved against git \
                  and CI metadata, pushes the tags and records the result in an image file."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(
        short = 'v',
        long,
        global = true,
        help = "Verbose mode - debug logging and streamed docker output"
    )]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Build a Docker image and publish its tags",
        long_about = "Builds the Dockerfile in the working path, tags the image from the tag \
                      specification and pushes every tag.\n\n\
                      Examples:\n  \
                      shipwright build --repo acme\n  \
                      shipwright build -r acme -n api -t lt,v_s\n  \
                      shipwright build -r acme --flatten --cache-from-latest\n  \
                      shipwright build -r acme --registry registry.example.com --no-push"
    )]
    Build(BuildArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct BuildArgs {
    #[arg(short = 'r', long, value_name = "REPO", help = "Docker repository (organisation) to publish under")]
    pub repo: String,

    #[arg(
        short = 'n',
        long,
        value_name = "NAME",
        help = "Image name (defaults to the working directory name)"
    )]
    pub name: Option<String>,

    #[arg(
        short = 'p',
        long,
        value_name = "PATH",
        default_value = DEFAULT_WORKING_PATH,
        help = "Docker build context"
    )]
    pub working_path: PathBuf,

    #[arg(
        short = 'd',
        long,
        value_name = "FILE",
        default_value = DEFAULT_DOCKER_FILE,
        help = "Dockerfile to build"
    )]
    pub docker_file: PathBuf,

    #[arg(long, value_name = "PREFIX", help = "Prepended to the image name")]
    pub name_prefix: Option<String>,

    #[arg(long, value_name = "POSTFIX", help = "Appended to the image name")]
    pub name_postfix: Option<String>,

    #[arg(
        short = 't',
        long,
        value_name = "SPEC",
        value_delimiter = ',',
        help = "Tag specifications, e.g. lt,v_s,b (defaults depend on the branch)"
    )]
    pub tags: Vec<String>,

    #[arg(
        long,
        value_name = "HOST",
        default_value = DEFAULT_REGISTRY,
        help = "Registry to publish to"
    )]
    pub registry: String,

    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        default_value = DEFAULT_OUTPUT_FILE,
        help = "Image file to write, relative to the working path"
    )]
    pub output: PathBuf,

    #[arg(
        short = 's',
        long,
        value_name = "BOOL",
        default_value_t = true,
        action = ArgAction::Set,
        help = "Skip tag and push for pull request builds"
    )]
    pub skip_prs: bool,

    #[arg(
        long,
        value_name = "BOOL",
        default_value_t = true,
        action = ArgAction::Set,
        help = "Only build when the runtime is an LTS release"
    )]
    pub lts_only: bool,

    #[arg(long, help = "Tag the image but do not push it")]
    pub no_push: bool,

    #[arg(long, help = "Run docker through sudo")]
    pub sudo: bool,

    #[arg(long, help = "Squash the built image into a single layer")]
    pub flatten: bool,

    #[arg(long, value_name = "IMAGE", help = "Image to pull and use as build cache")]
    pub cache_from: Option<String>,

    #[arg(
        long,
        conflicts_with = "cache_from",
        help = "Use the latest published tag of this image as build cache"
    )]
    pub cache_from_latest: bool,

    #[arg(
        long = "build-arg",
        value_name = "KEY=VALUE",
        value_parser = parse_build_arg,
        help = "Build argument passed to docker (repeatable)"
    )]
    pub build_args: Vec<(String, String)>,

    #[arg(long, help = "Apply branch tag defaults whatever the current branch")]
    pub always_build: bool,

    #[arg(
        long,
        value_name = "BRANCH",
        value_delimiter = ',',
        help = "Extra branches that get default tags"
    )]
    pub build_branches: Vec<String>,

    #[arg(long, help = "Show a spinner while the image builds")]
    pub progress: bool,
}

fn parse_build_arg(s: &str) -> Result<(String, String), String> {
    ShipwrightConfig::parse_key_value("build-arg", s).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn build_args(argv: &[&str]) -> BuildArgs {
        let mut full = vec!["shipwright", "build"];
        full.extend_from_slice(argv);
        match CliArgs::try_parse_from(full).unwrap().command {
            Commands::Build(args) => args,
        }
    }

    #[test]
    fn test_cli_args_verify() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn test_default_build_args() {
        let args = build_args(&["--repo", "acme"]);

        assert_eq!(args.repo, "acme");
        assert!(args.name.is_none());
        assert_eq!(args.working_path, PathBuf::from("."));
        assert_eq!(args.docker_file, PathBuf::from("Dockerfile"));
        assert!(args.tags.is_empty());
        assert_eq!(args.registry, "hub.docker.com");
        assert_eq!(args.output, PathBuf::from(".image.json"));
        assert!(args.skip_prs);
        assert!(args.lts_only);
        assert!(!args.no_push);
        assert!(!args.sudo);
        assert!(!args.flatten);
        assert!(!args.progress);
        assert!(args.build_args.is_empty());
    }

    #[test]
    fn test_repo_is_required() {
        let result = CliArgs::try_parse_from(["shipwright", "build"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_build_with_options() {
        let args = build_args(&[
            "-r",
            "acme",
            "-n",
            "api",
            "-p",
            "/src/api",
            "-d",
            "docker/Dockerfile.prod",
            "-t",
            "lt,v_s",
            "-t",
            "b",
            "--name-postfix",
            "-alpine",
            "--skip-prs",
            "false",
            "--lts-only",
            "false",
            "--no-push",
            "--flatten",
            "--build-arg",
            "NODE_ENV=production",
            "--build-branches",
            "develop,release",
        ]);

        assert_eq!(args.name.as_deref(), Some("api"));
        assert_eq!(args.working_path, PathBuf::from("/src/api"));
        assert_eq!(args.docker_file, PathBuf::from("docker/Dockerfile.prod"));
        assert_eq!(args.tags, vec!["lt", "v_s", "b"]);
        assert_eq!(args.name_postfix.as_deref(), Some("-alpine"));
        assert!(!args.skip_prs);
        assert!(!args.lts_only);
        assert!(args.no_push);
        assert!(args.flatten);
        assert_eq!(
            args.build_args,
            vec![("NODE_ENV".to_string(), "production".to_string())]
        );
        assert_eq!(args.build_branches, vec!["develop", "release"]);
    }

    #[test]
    fn test_invalid_build_arg_rejected() {
        let result = CliArgs::try_parse_from(["shipwright", "build", "-r", "acme", "--build-arg", "NOPE"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cache_flags_conflict() {
        let result = CliArgs::try_parse_from([
            "shipwright",
            "build",
            "-r",
            "acme",
            "--cache-from",
            "acme/base",
            "--cache-from-latest",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_verbose_flag() {
        let args = CliArgs::parse_from(["shipwright", "build", "-r", "acme", "--verbose"]);
        assert!(args.verbose);
        assert!(!args.quiet);
    }

    #[test]
    fn test_global_quiet_flag() {
        let args = CliArgs::parse_from(["shipwright", "-q", "build", "-r", "acme"]);
        assert!(!args.verbose);
        assert!(args.quiet);
    }

    #[test]
    fn test_log_level_flag() {
        let args = CliArgs::parse_from(["shipwright", "--log-level", "debug", "build", "-r", "acme"]);
        assert_eq!(args.log_level, Some("debug".to_string()));
    }
}
