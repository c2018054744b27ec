use serde::{Deserialize, Serialize};

/// Continuous-integration context of the current run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CiContext {
    #[serde(default)]
    pub pull_request: bool,
    #[serde(default)]
    pub tagged: bool,
}

impl CiContext {
    /// Reads the CI context from environment-style key lookups
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let set = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let pull_request = set("GITHUB_EVENT_NAME")
            .map(|e| e == "pull_request" || e == "pull_request_target")
            .unwrap_or(false)
            || set("TRAVIS_PULL_REQUEST")
                .map(|v| v != "false")
                .unwrap_or(false)
            || set("DRONE_PULL_REQUEST").is_some();

        let tagged = set("GITHUB_REF_TYPE").map(|v| v == "tag").unwrap_or(false)
            || set("TRAVIS_TAG").is_some()
            || set("DRONE_TAG").is_some();

        Self {
            pull_request,
            tagged,
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

/// Resolved build metadata, persisted as `.buildinfo.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
    #[serde(default)]
    pub tag: Vec<String>,

    #[serde(default)]
    pub branch: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default)]
    pub ci: CiContext,

    /// Whether the tag and push steps should run
    #[serde(rename = "continue", default)]
    pub should_continue: bool,
}

impl BuildInfo {
    /// Info that stops every downstream step
    pub fn halted() -> Self {
        Self::default()
    }

    pub fn tag_list(&self) -> String {
        self.tag.join(", ")
    }
}

/// Version of the runtime this run executes under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeInfo {
    pub version: String,
    pub is_lts: bool,
}

impl Default for RuntimeInfo {
    fn default() -> Self {
        Self {
            version: "unknown".to_string(),
            is_lts: true,
        }
    }
}

/// What is known about the run before build info is resolved
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefaultInfo {
    pub branch: String,
    pub ci: CiContext,
    pub runtime: RuntimeInfo,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_ci_context_github_pull_request() {
        let ci = CiContext::from_lookup(lookup(&[("GITHUB_EVENT_NAME", "pull_request")]));
        assert!(ci.pull_request);
        assert!(!ci.tagged);
    }

    #[test]
    fn test_ci_context_travis() {
        let ci = CiContext::from_lookup(lookup(&[
            ("TRAVIS_PULL_REQUEST", "false"),
            ("TRAVIS_TAG", "v1.0.0"),
        ]));
        assert!(!ci.pull_request);
        assert!(ci.tagged);

        let ci = CiContext::from_lookup(lookup(&[("TRAVIS_PULL_REQUEST", "42")]));
        assert!(ci.pull_request);
    }

    #[test]
    fn test_ci_context_empty_environment() {
        let ci = CiContext::from_lookup(lookup(&[("DRONE_TAG", "")]));
        assert_eq!(ci, CiContext::default());
    }

    #[test]
    fn test_build_info_serializes_with_wire_field_names() {
        let info = BuildInfo {
            tag: vec!["main".to_string()],
            branch: "main".to_string(),
            commit: None,
            version: Some("1.2.0".to_string()),
            ci: CiContext {
                pull_request: true,
                tagged: false,
            },
            should_continue: true,
        };

        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(value["tag"], serde_json::json!(["main"]));
        assert_eq!(value["ci"]["pullRequest"], true);
        assert_eq!(value["continue"], true);
        assert!(value.get("commit").is_none());
    }

    #[test]
    fn test_halted_info_does_not_continue() {
        let info = BuildInfo::halted();
        assert!(!info.should_continue);
        assert!(info.tag.is_empty());
    }
}
