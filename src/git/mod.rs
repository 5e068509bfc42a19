//! Git command runner.
//!
//! Every operation shells out to the `git` binary in the project root.

pub mod diff;
pub mod status;

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::Error;

pub use diff::DiffStats;
pub use status::{
    parse_branches, parse_porcelain, BranchEntry, BranchScope, StatusEntry, StatusKind,
};

/// Which side of the index to diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffKind {
    Staged,
    Unstaged,
}

/// Git operations the watch workflow depends on.
#[async_trait]
pub trait GitOps: Send + Sync {
    async fn is_repository(&self) -> bool;

    async fn current_branch(&self) -> Result<String, Error>;

    /// Porcelain status, empty when the working tree is clean.
    async fn status(&self) -> Result<String, Error>;

    async fn diff(&self, kind: DiffKind) -> Result<String, Error>;

    async fn stage_all(&self) -> Result<String, Error>;

    async fn commit(&self, message: &str) -> Result<String, Error>;

    async fn push(&self, branch: &str) -> Result<String, Error>;
}

/// Runs the system `git` binary.
#[derive(Debug, Clone)]
pub struct Git {
    root: PathBuf,
}

impl Git {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Run git with `args`, returning stdout on success.
    async fn run(&self, args: &[&str]) -> Result<String, Error> {
        self.run_labeled(args, &format!("git {}", args.join(" ")))
            .await
    }

    async fn run_labeled(&self, args: &[&str], label: &str) -> Result<String, Error> {
        debug!(command = label, "Running git");
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .output()
            .await?;

        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let stderr = if stderr.is_empty() {
            String::from_utf8_lossy(&output.stdout).trim().to_string()
        } else {
            stderr
        };
        Err(Error::CommandFailed {
            command: label.to_string(),
            code: output.status.code(),
            stderr,
        })
    }

    /// URL of the `origin` remote, if configured.
    pub async fn remote_url(&self) -> Option<String> {
        self.run(&["remote", "get-url", "origin"])
            .await
            .ok()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
    }

    /// One-line summary of HEAD, `None` before the first commit.
    pub async fn last_commit(&self) -> Option<String> {
        self.run(&["log", "-1", "--pretty=format:%h - %s (%an, %ar)"])
            .await
            .ok()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
    }

    /// Number of commits reachable from HEAD.
    pub async fn commit_count(&self) -> u64 {
        self.run(&["rev-list", "--count", "HEAD"])
            .await
            .ok()
            .and_then(|count| count.trim().parse().ok())
            .unwrap_or(0)
    }

    /// Branches sorted by most recent commit.
    pub async fn branches(&self, scope: BranchScope) -> Result<Vec<BranchEntry>, Error> {
        let mut args = vec!["branch"];
        if let Some(flag) = scope.flag() {
            args.push(flag);
        }
        args.push("--sort=-committerdate");
        let output = self.run(&args).await?;
        Ok(parse_branches(&output, scope))
    }

    /// Commits on HEAD not yet on `origin/<branch>`. `None` without an upstream.
    pub async fn unpushed_count(&self, branch: &str) -> Option<usize> {
        let range = format!("origin/{}..HEAD", branch);
        self.run(&["log", &range, "--oneline"])
            .await
            .ok()
            .map(|log| log.lines().filter(|l| !l.trim().is_empty()).count())
    }

    /// `git config user.email`, used to prefill SSH key comments.
    pub async fn user_email(&self) -> Option<String> {
        self.run(&["config", "user.email"])
            .await
            .ok()
            .map(|email| email.trim().to_string())
            .filter(|email| !email.is_empty())
    }
}

#[async_trait]
impl GitOps for Git {
    async fn is_repository(&self) -> bool {
        if self.root.join(".git").exists() {
            return true;
        }
        let Ok(toplevel) = self.run(&["rev-parse", "--show-toplevel"]).await else {
            return false;
        };
        let toplevel = PathBuf::from(toplevel.trim());
        match (toplevel.canonicalize(), self.root.canonicalize()) {
            (Ok(top), Ok(root)) => top == root,
            _ => false,
        }
    }

    async fn current_branch(&self) -> Result<String, Error> {
        let branch = self.run(&["rev-parse", "--abbrev-ref", "HEAD"]).await?;
        Ok(branch.trim().to_string())
    }

    async fn status(&self) -> Result<String, Error> {
        self.run(&["status", "--porcelain"]).await
    }

    async fn diff(&self, kind: DiffKind) -> Result<String, Error> {
        match kind {
            DiffKind::Staged => self.run(&["diff", "--cached"]).await,
            DiffKind::Unstaged => self.run(&["diff"]).await,
        }
    }

    async fn stage_all(&self) -> Result<String, Error> {
        self.run(&["add", "."]).await
    }

    async fn commit(&self, message: &str) -> Result<String, Error> {
        // message goes as a separate argv entry, never through a shell
        match self.run_labeled(&["commit", "-m", message], "git commit").await {
            Err(e) if e.is_nothing_to_commit() => Err(Error::NoChanges),
            result => result,
        }
    }

    async fn push(&self, branch: &str) -> Result<String, Error> {
        self.run(&["push", "origin", branch]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_dot_git_dir_is_repository() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();

        let git = Git::new(dir.path());
        assert!(git.is_repository().await);
    }

    #[tokio::test]
    async fn test_plain_dir_is_not_repository() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("not-a-repo");
        std::fs::create_dir(&nested).unwrap();

        // Either git is missing or the toplevel differs; both mean "no".
        let git = Git::new(&nested);
        assert!(!git.is_repository().await);
    }
}
