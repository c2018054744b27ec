use shipwright::cli::commands::{CliArgs, Commands};
use shipwright::cli::handlers::handle_build;
use shipwright::util::logging::{config_from_env, init_logging, resolve_level};
use shipwright::VERSION;

use clap::Parser;
use std::env;
use tracing::debug;

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("shipwright v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Build(build_args) => handle_build(build_args, args.verbose).await,
    };

    std::process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs) {
    let fallback = env::var("SHIPWRIGHT_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let level = resolve_level(args.log_level.as_deref(), args.verbose, args.quiet, &fallback);
    init_logging(config_from_env(Some(level)));
}
