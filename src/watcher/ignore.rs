//! Glob-based ignore rules for watched paths.

use std::path::Path;

use glob::Pattern;

use crate::error::Error;

#[derive(Debug, Clone)]
struct Rule {
    pattern: Pattern,
    /// `foo` for a `foo/**` pattern, so the directory itself matches.
    dir_prefix: Option<String>,
    /// `*.tmp` for a `**/*.tmp` pattern, so top-level files match.
    file_pattern: Option<Pattern>,
}

/// Decides which relative paths the watcher drops.
#[derive(Debug, Clone)]
pub struct IgnoreMatcher {
    rules: Vec<Rule>,
}

impl IgnoreMatcher {
    pub fn new<I, S>(patterns: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut rules = Vec::new();
        for raw in patterns {
            let raw = raw.as_ref().trim();
            if raw.is_empty() {
                continue;
            }
            let file_pattern = match raw.strip_prefix("**/") {
                Some(rest) => Some(Pattern::new(rest)?),
                None => None,
            };
            rules.push(Rule {
                pattern: Pattern::new(raw)?,
                dir_prefix: raw.strip_suffix("/**").map(str::to_string),
                file_pattern,
            });
        }
        Ok(Self { rules })
    }

    /// True when `path` (relative to the watch root) matches any rule.
    pub fn is_ignored(&self, path: &Path) -> bool {
        let rel = path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        self.rules.iter().any(|rule| {
            rule.pattern.matches(&rel)
                || (!file_name.is_empty() && rule.pattern.matches(&file_name))
                || rule.dir_prefix.as_deref().is_some_and(|dir| {
                    rel == dir || rel.starts_with(&format!("{}/", dir))
                })
                || rule
                    .file_pattern
                    .as_ref()
                    .is_some_and(|p| p.matches(&file_name))
        })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
