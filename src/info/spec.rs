//! Tag specification expansion
//!
//! A spec is a list of tokens joined by `_`. Each token expands to a fact
//! about the checkout:
//!
//! | token | value                          |
//! |-------|--------------------------------|
//! | `lt`  | `latest`                       |
//! | `b`   | branch name                    |
//! | `s`   | short commit sha               |
//! | `c`   | commit count                   |
//! | `v`   | version (latest git tag)       |
//! | `ma`  | major version                  |
//! | `mi`  | major.minor version            |
//!
//! Anything else is kept literally. If any token has no value the whole
//! spec expands to an empty tag.

/// Facts about a checkout that tag specs expand from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoFacts {
    pub branch: String,
    pub commit: Option<String>,
    pub commit_count: Option<u64>,
    pub version: Option<String>,
}

impl RepoFacts {
    fn version_part(&self, parts: usize) -> Option<String> {
        let version = self.version.as_deref()?;
        let core = version.split(['-', '+']).next().unwrap_or(version);
        let selected: Vec<&str> = core.split('.').take(parts).collect();
        if selected.len() < parts || selected.iter().any(|p| p.is_empty()) {
            return None;
        }
        Some(selected.join("."))
    }
}

pub fn expand_tag_spec(spec: &str, facts: &RepoFacts) -> String {
    let mut parts = Vec::new();

    for token in spec.trim().split('_') {
        let value = match token {
            "lt" => Some("latest".to_string()),
            "b" => Some(facts.branch.clone()),
            "s" => facts.commit.clone(),
            "c" => facts.commit_count.map(|c| c.to_string()),
            "v" => facts.version.clone(),
            "ma" => facts.version_part(1),
            "mi" => facts.version_part(2),
            literal => Some(literal.to_string()),
        };

        match value {
            Some(v) if !v.is_empty() => parts.push(v),
            _ => return String::new(),
        }
    }

    parts.join("_")
}

/// Splits comma separated spec lists, dropping blanks
pub fn split_specs<S: AsRef<str>>(specs: &[S]) -> Vec<String> {
    specs
        .iter()
        .flat_map(|s| s.as_ref().split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
