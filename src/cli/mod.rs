//! CLI commands for code_buddy.

pub mod branch;
pub mod info;
pub mod providers;
pub mod ssh;
pub mod status;
pub mod watch;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use crate::error::Error;
use crate::git::{Git, GitOps};

/// code_buddy - a git assistant with a commit-on-save watcher
#[derive(Parser)]
#[command(name = "code_buddy")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show enhanced git status with helpful information
    #[command(alias = "s")]
    Status,

    /// Show repository information and current branch details
    #[command(alias = "i")]
    Info,

    /// List branches with additional information
    #[command(alias = "b")]
    Branch {
        /// Show remote branches
        #[arg(short, long)]
        remote: bool,

        /// Show all branches (local and remote)
        #[arg(short, long)]
        all: bool,
    },

    /// Watch files, run checks, then commit and push changes
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Generate and set up an SSH key for GitHub
    #[command(name = "ssh-setup", alias = "ssh")]
    SshSetup {
        /// Email address for the SSH key
        email: Option<String>,
    },

    /// Show which AI providers have credentials
    Providers,
}

impl Commands {
    pub fn is_verbose(&self) -> bool {
        matches!(self, Self::Watch(args) if args.verbose)
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct WatchArgs {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Use AI for commit message generation
    #[arg(long)]
    pub use_ai: bool,

    /// Skip running tests on file change
    #[arg(long)]
    pub no_tests: bool,

    /// Skip linting on file change
    #[arg(long)]
    pub no_lint: bool,

    /// Automatically confirm all prompts
    #[arg(long)]
    pub yes: bool,

    /// Additional patterns to ignore
    #[arg(long, num_args = 1..)]
    pub ignore: Vec<String>,

    /// Poll for changes instead of using native events (network drives)
    #[arg(long)]
    pub poll: bool,
}

/// Working directory of the process.
pub(crate) fn current_dir() -> Result<PathBuf, Error> {
    Ok(std::env::current_dir()?)
}

/// Git runner for `root`, failing if it is not a repository.
pub(crate) async fn open_repository(root: &Path) -> Result<Git, Error> {
    let git = Git::new(root);
    if !git.is_repository().await {
        return Err(Error::NotARepository);
    }
    Ok(git)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_parse() {
        let cli = Cli::try_parse_from(["code_buddy", "s"]).unwrap();
        assert!(matches!(cli.command, Commands::Status));

        let cli = Cli::try_parse_from(["code_buddy", "b", "-a"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Branch {
                all: true,
                remote: false
            }
        ));

        let cli = Cli::try_parse_from(["code_buddy", "ssh", "me@example.com"]).unwrap();
        match cli.command {
            Commands::SshSetup { email } => assert_eq!(email.as_deref(), Some("me@example.com")),
            _ => panic!("expected ssh-setup"),
        }
    }

    #[test]
    fn test_watch_flags() {
        let cli = Cli::try_parse_from([
            "code_buddy",
            "watch",
            "-v",
            "--no-lint",
            "--yes",
            "--ignore",
            "build/**",
            "*.snap",
        ])
        .unwrap();

        assert!(cli.command.is_verbose());
        match cli.command {
            Commands::Watch(args) => {
                assert!(args.no_lint);
                assert!(!args.no_tests);
                assert!(args.yes);
                assert_eq!(args.ignore, vec!["build/**", "*.snap"]);
            }
            _ => panic!("expected watch"),
        }
    }
}
