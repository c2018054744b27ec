pub mod commands;
pub mod handlers;

pub use commands::{BuildArgs, CliArgs, Commands};
pub use handlers::{handle_build, prepare_request};
