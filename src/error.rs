//! Error types for code_buddy.

use std::path::PathBuf;

use thiserror::Error;

/// Crate error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid ignore pattern: {0}")]
    InvalidPattern(#[from] glob::PatternError),

    /// An external command (git, test, lint, ssh-keygen) exited non-zero.
    #[error("`{command}` failed{}: {stderr}", exit_suffix(.code))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// A commit message provider could not produce a message.
    #[error("{provider}: {message}")]
    Provider { provider: String, message: String },

    #[error("This is not a git repository")]
    NotARepository,

    #[error("No changes to commit")]
    NoChanges,

    #[error("Failed to parse config {}: {message}", .path.display())]
    ConfigParse { path: PathBuf, message: String },

    #[error("SSH key already exists at {}. Use a different name or remove existing key.", .0.display())]
    SshKeyExists(PathBuf),

    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("An email address is required for the SSH key")]
    MissingEmail,
}

fn exit_suffix(code: &Option<i32>) -> String {
    code.map(|c| format!(" with exit code {}", c)).unwrap_or_default()
}

impl Error {
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// True for `git commit` refusing because the index is empty.
    pub fn is_nothing_to_commit(&self) -> bool {
        matches!(self, Self::CommandFailed { stderr, .. } if stderr.contains("nothing to commit"))
    }
}
