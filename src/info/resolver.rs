use super::spec::{expand_tag_spec, RepoFacts};
use super::types::{BuildInfo, CiContext, DefaultInfo, RuntimeInfo};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

const BRANCH_ENV_VARS: &[&str] = &[
    "GITHUB_HEAD_REF",
    "GITHUB_REF_NAME",
    "BRANCH_NAME",
    "DRONE_BRANCH",
    "TRAVIS_BRANCH",
];

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not determine the current branch of '{0}'")]
    UnknownBranch(String),

    #[error("{0}")]
    Other(String),
}

/// Resolves tags, branch and CI context for a checkout
#[async_trait]
pub trait BuildInfoResolver: Send + Sync {
    async fn resolve(
        &self,
        working_path: &Path,
        tag_specs: &[String],
    ) -> Result<BuildInfo, ResolveError>;
}

/// Resolver backed by the `git` binary and CI environment variables
#[derive(Debug, Clone)]
pub struct GitInfoResolver {
    git_binary: String,
}

impl Default for GitInfoResolver {
    fn default() -> Self {
        Self {
            git_binary: "git".to_string(),
        }
    }
}

impl GitInfoResolver {
    pub fn new(git_binary: impl Into<String>) -> Self {
        Self {
            git_binary: git_binary.into(),
        }
    }

    /// Runs git in `repo`; a non-zero exit (no tags, detached HEAD, ...)
    /// yields `None`.
    async fn git(&self, repo: &Path, args: &[&str]) -> Result<Option<String>, ResolveError> {
        let command = format!("{} {}", self.git_binary, args.join(" "));
        let output = Command::new(&self.git_binary)
            .args(args)
            .current_dir(repo)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| ResolveError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            debug!(
                command = %command,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "git command failed"
            );
            return Ok(None);
        }

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(Some(stdout).filter(|s| !s.is_empty()))
    }

    pub async fn branch(&self, repo: &Path) -> Result<String, ResolveError> {
        if let Some(branch) = BRANCH_ENV_VARS
            .iter()
            .filter_map(|key| std::env::var(key).ok())
            .find(|v| !v.is_empty())
        {
            return Ok(branch);
        }

        self.git(repo, &["rev-parse", "--abbrev-ref", "HEAD"])
            .await?
            .filter(|b| b != "HEAD")
            .ok_or_else(|| ResolveError::UnknownBranch(repo.display().to_string()))
    }

    pub async fn facts(&self, repo: &Path) -> Result<RepoFacts, ResolveError> {
        let branch = self.branch(repo).await?;
        let commit = self.git(repo, &["rev-parse", "--short", "HEAD"]).await?;
        let commit_count = self
            .git(repo, &["rev-list", "--count", "HEAD"])
            .await?
            .and_then(|c| c.parse().ok());
        let version = self
            .git(repo, &["describe", "--tags", "--abbrev=0"])
            .await?
            .map(|v| v.trim_start_matches('v').to_string());

        Ok(RepoFacts {
            branch,
            commit,
            commit_count,
            version,
        })
    }

    /// What is known before any tag spec is expanded
    pub async fn default_info(
        &self,
        repo: &Path,
        runtime: RuntimeInfo,
    ) -> Result<DefaultInfo, ResolveError> {
        Ok(DefaultInfo {
            branch: self.branch(repo).await?,
            ci: CiContext::from_env(),
            runtime,
        })
    }
}

#[async_trait]
impl BuildInfoResolver for GitInfoResolver {
    async fn resolve(
        &self,
        working_path: &Path,
        tag_specs: &[String],
    ) -> Result<BuildInfo, ResolveError> {
        let facts = self.facts(working_path).await?;
        let tag = tag_specs
            .iter()
            .map(|spec| expand_tag_spec(spec, &facts))
            .collect();

        debug!(branch = %facts.branch, specs = ?tag_specs, "Resolved repository facts");

        Ok(BuildInfo {
            tag,
            branch: facts.branch,
            commit: facts.commit,
            version: facts.version,
            ci: CiContext::from_env(),
            should_continue: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    struct EnvGuard {
        key: String,
        old_value: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &str, value: &str) -> Self {
            let old_value = std::env::var(key).ok();
            std::env::set_var(key, value);
            Self {
                key: key.to_string(),
                old_value,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.old_value {
                Some(v) => std::env::set_var(&self.key, v),
                None => std::env::remove_var(&self.key),
            }
        }
    }

    #[tokio::test]
    #[serial]
    async fn test_branch_prefers_ci_environment() {
        let _guards = [
            EnvGuard::set("GITHUB_HEAD_REF", ""),
            EnvGuard::set("GITHUB_REF_NAME", "feature/login"),
        ];
        let temp = TempDir::new().unwrap();

        let branch = GitInfoResolver::default().branch(temp.path()).await.unwrap();
        assert_eq!(branch, "feature/login");
    }

    #[tokio::test]
    async fn test_missing_git_binary_is_a_spawn_error() {
        let temp = TempDir::new().unwrap();
        let resolver = GitInfoResolver::new("shipwright-no-such-git");

        let result = resolver
            .git(temp.path(), &["rev-parse", "HEAD"])
            .await;
        assert!(matches!(result, Err(ResolveError::Spawn { .. })));
    }
}
