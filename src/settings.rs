//! Defaults applied to a build before the pipeline starts
//!
//! Explicit command-line values always win. These only fill what was left
//! out: the image name, the working path, the build file and the tag specs
//! for the current branch.

use std::path::Path;

pub const DEFAULT_WORKING_PATH: &str = ".";
pub const DEFAULT_DOCKER_FILE: &str = "Dockerfile";

/// Tag specs for builds on the default branch
pub const DEFAULT_BRANCH_SPECS: &[&str] = &["lt", "v_s", "mi", "ma"];

/// Tag specs for builds on any other build branch
pub const OTHER_BRANCH_SPECS: &[&str] = &["b_s"];

/// Image name taken from the last component of the working path
pub fn default_name(working_path: &Path) -> Option<String> {
    working_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
}

/// Decides which branches produce tagged images
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchPolicy {
    pub default_branch: String,
    /// Extra branches to build besides the default one
    pub build_branches: Vec<String>,
    /// Treat the current branch as a build branch whatever its name
    pub always_build: bool,
}

impl BranchPolicy {
    pub fn new(default_branch: impl Into<String>) -> Self {
        Self {
            default_branch: default_branch.into(),
            build_branches: Vec::new(),
            always_build: false,
        }
    }

    pub fn with_build_branches(mut self, branches: Vec<String>) -> Self {
        self.build_branches = branches;
        self
    }

    pub fn with_always_build(mut self, always_build: bool) -> Self {
        self.always_build = always_build;
        self
    }

    pub fn is_build_branch(&self, branch: &str) -> bool {
        self.always_build
            || branch == self.default_branch
            || self.build_branches.iter().any(|b| b == branch)
    }

    /// Tag specs used when none were given on the command line
    pub fn default_tag_specs(&self, branch: &str) -> Vec<String> {
        let specs = if !self.is_build_branch(branch) {
            &[][..]
        } else if branch == self.default_branch {
            DEFAULT_BRANCH_SPECS
        } else {
            OTHER_BRANCH_SPECS
        };
        specs.iter().map(|s| s.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_default_name_from_working_path() {
        assert_eq!(
            default_name(&PathBuf::from("/home/dev/web-app")),
            Some("web-app".to_string())
        );
        assert_eq!(default_name(&PathBuf::from("/")), None);
    }

    #[test]
    fn test_default_branch_specs() {
        let policy = BranchPolicy::new("main");
        assert_eq!(policy.default_tag_specs("main"), vec!["lt", "v_s", "mi", "ma"]);
    }

    #[test]
    fn test_unlisted_branch_gets_no_specs() {
        let policy = BranchPolicy::new("main");
        assert!(!policy.is_build_branch("feature/login"));
        assert!(policy.default_tag_specs("feature/login").is_empty());
    }

    #[test]
    fn test_listed_branch_gets_branch_specs() {
        let policy = BranchPolicy::new("main").with_build_branches(vec!["develop".to_string()]);
        assert_eq!(policy.default_tag_specs("develop"), vec!["b_s"]);
    }

    #[test]
    fn test_always_build_forces_current_branch() {
        let policy = BranchPolicy::new("main").with_always_build(true);
        assert_eq!(policy.default_tag_specs("feature/login"), vec!["b_s"]);
        assert_eq!(policy.default_tag_specs("main"), vec!["lt", "v_s", "mi", "ma"]);
    }
}
