//! Build information: resolved tags, branch and CI context.

pub mod mock;
pub mod resolver;
pub mod spec;
pub mod types;

pub use mock::StaticInfoResolver;
pub use resolver::{BuildInfoResolver, GitInfoResolver, ResolveError};
pub use spec::{expand_tag_spec, split_specs, RepoFacts};
pub use types::{BuildInfo, CiContext, DefaultInfo, RuntimeInfo};
