//! Workflow configuration.
//!
//! Looks for `.code_buddyrc` style files from the working directory upwards,
//! stopping at the home directory. The first file found wins and any field it
//! leaves out keeps its default.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::Error;

/// Name used for the `package.json` key and rc file names.
pub const MODULE_NAME: &str = "code_buddy";

/// Patterns the watcher always ignores.
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &[
    ".git/**",
    "node_modules/**",
    "target/**",
    "dist/**",
    ".DS_Store",
    "*.log",
    ".env*",
    "coverage/**",
    ".nyc_output/**",
    "**/*.tmp",
    "**/*.temp",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    PackageJson,
    Yaml,
    Json,
    Toml,
}

/// File names checked in each directory, in order.
const SEARCH_PLACES: &[(&str, Format)] = &[
    ("package.json", Format::PackageJson),
    (".code_buddyrc", Format::Yaml),
    (".code_buddyrc.json", Format::Json),
    (".code_buddyrc.yaml", Format::Yaml),
    (".code_buddy.toml", Format::Toml),
    (".gitassistrc", Format::Yaml),
    (".gitassistrc.json", Format::Json),
];

/// User configuration as written in an rc file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Branch pushed to after committing.
    #[serde(default = "default_branch")]
    pub branch: String,

    #[serde(default = "default_true")]
    pub run_tests: bool,

    #[serde(default = "default_true")]
    pub run_lint: bool,

    /// Ask a remote provider for the commit message.
    #[serde(default, rename = "useAI", alias = "useAi")]
    pub use_ai: bool,

    #[serde(default = "default_test_command")]
    pub test_command: String,

    #[serde(default = "default_lint_command")]
    pub lint_command: String,

    /// Extra glob patterns the watcher should ignore.
    #[serde(default)]
    pub watch_ignore: Vec<String>,

    /// Commit and push without asking.
    #[serde(default)]
    pub auto_confirm: bool,
}

fn default_true() -> bool {
    true
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_test_command() -> String {
    "npm test".to_string()
}

fn default_lint_command() -> String {
    "npm run lint".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            branch: default_branch(),
            run_tests: true,
            run_lint: true,
            use_ai: false,
            test_command: default_test_command(),
            lint_command: default_lint_command(),
            watch_ignore: Vec::new(),
            auto_confirm: false,
        }
    }
}

/// A config together with the file it came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub path: Option<PathBuf>,
}

impl LoadedConfig {
    /// Loaded from a pre-rename `.gitassistrc` file.
    pub fn is_legacy(&self) -> bool {
        self.path
            .as_ref()
            .and_then(|p| p.file_name())
            .is_some_and(|name| name.to_string_lossy().starts_with(".gitassistrc"))
    }
}

impl Config {
    /// Load config for the working directory, searching up to the home directory.
    pub fn load(start: &Path) -> Result<LoadedConfig, Error> {
        let home = dirs::home_dir();
        Self::discover(start, home.as_deref())
    }

    /// Search `start` and its ancestors, stopping after `stop_dir`.
    pub fn discover(start: &Path, stop_dir: Option<&Path>) -> Result<LoadedConfig, Error> {
        for dir in start.ancestors() {
            for (name, format) in SEARCH_PLACES {
                let path = dir.join(name);
                if !path.is_file() {
                    continue;
                }
                if let Some(config) = Self::read(&path, *format)? {
                    debug!(path = %path.display(), "Loaded config");
                    return Ok(LoadedConfig {
                        config,
                        path: Some(path),
                    });
                }
            }
            if stop_dir.is_some_and(|stop| stop == dir) {
                break;
            }
        }

        Ok(LoadedConfig {
            config: Self::default(),
            path: None,
        })
    }

    /// Parse a single file. `Ok(None)` means the file holds no config for us.
    fn read(path: &Path, format: Format) -> Result<Option<Self>, Error> {
        let content = fs::read_to_string(path)?;
        let parse_err = |message: String| Error::ConfigParse {
            path: path.to_path_buf(),
            message,
        };

        match format {
            Format::PackageJson => {
                let mut manifest: serde_json::Value =
                    serde_json::from_str(&content).map_err(|e| parse_err(e.to_string()))?;
                match manifest.get_mut(MODULE_NAME).map(serde_json::Value::take) {
                    Some(section) => serde_json::from_value(section)
                        .map(Some)
                        .map_err(|e| parse_err(e.to_string())),
                    None => Ok(None),
                }
            }
            Format::Json => serde_json::from_str(&content)
                .map(Some)
                .map_err(|e| parse_err(e.to_string())),
            Format::Yaml => {
                if content.trim().is_empty() {
                    return Ok(Some(Self::default()));
                }
                serde_yaml::from_str(&content)
                    .map(Some)
                    .map_err(|e| parse_err(e.to_string()))
            }
            Format::Toml => toml::from_str(&content)
                .map(Some)
                .map_err(|e| parse_err(e.to_string())),
        }
    }
}

/// Flags passed to `watch` that override the file config.
#[derive(Debug, Clone, Default)]
pub struct WatchOverrides {
    pub use_ai: bool,
    pub no_tests: bool,
    pub no_lint: bool,
    pub yes: bool,
    pub ignore: Vec<String>,
}

/// Settings for one watch session. Resolved once and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowConfig {
    pub branch: String,
    pub run_tests: bool,
    pub run_lint: bool,
    pub use_ai: bool,
    pub test_command: String,
    pub lint_command: String,
    pub auto_confirm: bool,
    /// Defaults, then config patterns, then command line patterns.
    pub ignore: Vec<String>,
}

impl WorkflowConfig {
    pub fn resolve(config: Config, overrides: &WatchOverrides) -> Self {
        let ignore = DEFAULT_IGNORE_PATTERNS
            .iter()
            .map(|p| p.to_string())
            .chain(config.watch_ignore)
            .chain(overrides.ignore.iter().cloned())
            .collect();

        Self {
            branch: config.branch,
            run_tests: config.run_tests && !overrides.no_tests,
            run_lint: config.run_lint && !overrides.no_lint,
            use_ai: config.use_ai || overrides.use_ai,
            test_command: config.test_command,
            lint_command: config.lint_command,
            auto_confirm: config.auto_confirm || overrides.yes,
            ignore,
        }
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self::resolve(Config::default(), &WatchOverrides::default())
    }
}
