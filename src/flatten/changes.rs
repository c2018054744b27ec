//! Translates an inspected image's runtime configuration into the commit
//! instructions reapplied when the flattened filesystem is imported.

use crate::engine::{ImageConfig, ImageInspect};

/// Ordered commit instructions plus the inspected image size.
///
/// The size only drives strategy selection and is never passed to the engine
/// alongside the instructions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitInstructions {
    pub instructions: Vec<String>,
    pub size_bytes: u64,
}

impl CommitInstructions {
    pub fn from_inspect(inspect: &ImageInspect) -> Self {
        let instructions = inspect
            .config
            .as_ref()
            .map(instructions_for)
            .unwrap_or_default();

        Self {
            instructions,
            size_bytes: inspect.size,
        }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

fn instructions_for(config: &ImageConfig) -> Vec<String> {
    let mut changes = Vec::new();

    if let Some(user) = non_empty(&config.user) {
        changes.push(format!("USER {}", user));
    }
    if let Some(dir) = non_empty(&config.working_dir) {
        changes.push(format!("WORKDIR {}", dir));
    }
    for entry in config.env.iter().flatten() {
        changes.push(env_instruction(entry));
    }
    for port in config.exposed_ports.iter().flat_map(|ports| ports.keys()) {
        changes.push(format!("EXPOSE {}", port));
    }
    if let Some(cmd) = json_array(&config.cmd) {
        changes.push(format!("CMD {}", cmd));
    }
    if let Some(entrypoint) = json_array(&config.entrypoint) {
        changes.push(format!("ENTRYPOINT {}", entrypoint));
    }

    changes
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn json_array(value: &Option<Vec<String>>) -> Option<String> {
    value
        .as_ref()
        .filter(|items| !items.is_empty())
        .map(|items| serde_json::Value::from(items.clone()).to_string())
}

/// Renders one `KEY=value` environment entry as an `ENV` instruction.
///
/// Values containing a space are quoted, with newlines flattened to spaces
/// and `"` and `!` escaped.
pub fn env_instruction(entry: &str) -> String {
    let (key, value) = entry.split_once('=').unwrap_or((entry, ""));

    if value.contains(' ') {
        let escaped = value
            .replace('\n', " ")
            .replace('"', "\\\"")
            .replace('!', "\\!");
        format!("ENV {}=\"{}\"", key, escaped)
    } else {
        format!("ENV {}={}", key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn inspect_with(config: ImageConfig, size: u64) -> ImageInspect {
        ImageInspect {
            id: "sha256:test".to_string(),
            size,
            config: Some(config),
        }
    }

    #[test]
    fn test_full_config_in_fixed_order() {
        let config = ImageConfig {
            user: Some("node".to_string()),
            working_dir: Some("/app".to_string()),
            env: Some(vec![
                "PATH=/usr/local/bin:/usr/bin".to_string(),
                "GREETING=hello world".to_string(),
            ]),
            exposed_ports: Some(BTreeMap::from([
                ("8080/tcp".to_string(), serde_json::json!({})),
                ("9090/tcp".to_string(), serde_json::json!({})),
            ])),
            cmd: Some(vec!["node".to_string(), "index.js".to_string()]),
            entrypoint: Some(vec!["/sbin/tini".to_string(), "--".to_string()]),
        };

        let changes = CommitInstructions::from_inspect(&inspect_with(config, 42));

        assert_eq!(
            changes.instructions,
            vec![
                "USER node",
                "WORKDIR /app",
                "ENV PATH=/usr/local/bin:/usr/bin",
                "ENV GREETING=\"hello world\"",
                "EXPOSE 8080/tcp",
                "EXPOSE 9090/tcp",
                "CMD [\"node\",\"index.js\"]",
                "ENTRYPOINT [\"/sbin/tini\",\"--\"]",
            ]
        );
        assert_eq!(changes.size_bytes, 42);
    }

    #[test]
    fn test_empty_fields_are_omitted() {
        let config = ImageConfig {
            user: Some(String::new()),
            working_dir: None,
            env: Some(Vec::new()),
            exposed_ports: None,
            cmd: Some(Vec::new()),
            entrypoint: None,
        };

        let changes = CommitInstructions::from_inspect(&inspect_with(config, 7));
        assert!(changes.is_empty());
        assert_eq!(changes.size_bytes, 7);
    }

    #[test]
    fn test_missing_config_keeps_size() {
        let inspect = ImageInspect {
            id: String::new(),
            size: 1024,
            config: None,
        };
        let changes = CommitInstructions::from_inspect(&inspect);
        assert_eq!(changes.len(), 0);
        assert_eq!(changes.size_bytes, 1024);
    }

    #[test]
    fn test_env_with_space_is_quoted() {
        assert_eq!(env_instruction("KEY=hello world"), "ENV KEY=\"hello world\"");
    }

    #[test]
    fn test_env_without_space_is_bare() {
        assert_eq!(env_instruction("KEY=a!b"), "ENV KEY=a!b");
    }

    #[test]
    fn test_env_escapes_bang_quote_and_newline() {
        assert_eq!(env_instruction("KEY=a! b"), "ENV KEY=\"a\\! b\"");
        assert_eq!(
            env_instruction("KEY=say \"hi\""),
            "ENV KEY=\"say \\\"hi\\\"\""
        );
        assert_eq!(env_instruction("KEY=line one\nline two"), "ENV KEY=\"line one line two\"");
    }

    #[test]
    fn test_env_keeps_value_after_first_equals() {
        assert_eq!(env_instruction("OPTS=a=b=c"), "ENV OPTS=a=b=c");
    }

    #[test]
    fn test_env_without_equals() {
        assert_eq!(env_instruction("FLAG"), "ENV FLAG=");
    }
}
