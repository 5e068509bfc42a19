//! Quality gate: the configured test and lint commands.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::WorkflowConfig;
use crate::ui;

/// Captured result of a shell command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Runs arbitrary shell commands.
#[async_trait]
pub trait CheckRunner: Send + Sync {
    async fn run(&self, command: &str) -> CheckOutput;
}

/// Runs commands through the platform shell in the project root.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    root: PathBuf,
}

impl ShellRunner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn command(&self, command: &str) -> Command {
        let mut cmd = if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C");
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.arg("-c");
            cmd
        };
        cmd.arg(command).current_dir(&self.root);
        cmd
    }
}

#[async_trait]
impl CheckRunner for ShellRunner {
    async fn run(&self, command: &str) -> CheckOutput {
        debug!(command, "Running check");
        match self.command(command).output().await {
            Ok(output) => CheckOutput {
                success: output.status.success(),
                stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            },
            Err(e) => {
                warn!(command, error = %e, "Failed to spawn check");
                CheckOutput {
                    success: false,
                    stdout: String::new(),
                    stderr: e.to_string(),
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Passed,
    Failed,
    Skipped,
}

impl CheckStatus {
    pub fn passed(self) -> bool {
        self != Self::Failed
    }
}

/// Outcome of the quality gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckResults {
    pub tests: CheckStatus,
    pub lint: CheckStatus,
}

impl CheckResults {
    /// Both checks passed or were skipped.
    pub fn all_passed(&self) -> bool {
        self.tests.passed() && self.lint.passed()
    }
}

/// Run tests then lint, each only if enabled.
pub async fn run_checks(config: &WorkflowConfig, runner: &dyn CheckRunner) -> CheckResults {
    let tests = if config.run_tests {
        run_one(runner, &config.test_command, "🧪 Running tests...", "Tests").await
    } else {
        ui::warn("⏭️  Skipping tests (disabled in config)");
        CheckStatus::Skipped
    };

    let lint = if config.run_lint {
        run_one(runner, &config.lint_command, "🔍 Running linter...", "Linting").await
    } else {
        ui::warn("⏭️  Skipping linting (disabled in config)");
        CheckStatus::Skipped
    };

    CheckResults { tests, lint }
}

async fn run_one(
    runner: &dyn CheckRunner,
    command: &str,
    banner: &str,
    label: &str,
) -> CheckStatus {
    ui::step(banner);
    let output = runner.run(command).await;

    if output.success {
        ui::success(&format!("✅ {} passed", label));
        if !output.stdout.is_empty() {
            ui::muted(&output.stdout);
        }
        CheckStatus::Passed
    } else {
        ui::failure(&format!("❌ {} failed", label));
        if !output.stderr.is_empty() {
            ui::failure(&output.stderr);
        }
        if !output.stdout.is_empty() {
            ui::muted(&output.stdout);
        }
        CheckStatus::Failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Fails any command containing one of `failing`.
    struct ScriptedRunner {
        failing: Vec<&'static str>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedRunner {
        fn new(failing: Vec<&'static str>) -> Self {
            Self {
                failing,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CheckRunner for ScriptedRunner {
        async fn run(&self, command: &str) -> CheckOutput {
            self.calls.lock().unwrap().push(command.to_string());
            CheckOutput {
                success: !self.failing.iter().any(|f| command.contains(f)),
                ..CheckOutput::default()
            }
        }
    }

    #[tokio::test]
    async fn test_both_pass() {
        let runner = ScriptedRunner::new(vec![]);
        let results = run_checks(&WorkflowConfig::default(), &runner).await;
        assert!(results.all_passed());
        assert_eq!(
            *runner.calls.lock().unwrap(),
            vec!["npm test".to_string(), "npm run lint".to_string()]
        );
    }

    #[tokio::test]
    async fn test_lint_failure_fails_gate() {
        let runner = ScriptedRunner::new(vec!["lint"]);
        let results = run_checks(&WorkflowConfig::default(), &runner).await;
        assert_eq!(results.tests, CheckStatus::Passed);
        assert_eq!(results.lint, CheckStatus::Failed);
        assert!(!results.all_passed());
    }

    #[tokio::test]
    async fn test_failing_tests_still_run_lint() {
        let runner = ScriptedRunner::new(vec!["npm test"]);
        let results = run_checks(&WorkflowConfig::default(), &runner).await;
        assert_eq!(results.tests, CheckStatus::Failed);
        assert_eq!(runner.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_disabled_checks_are_skipped() {
        let config = WorkflowConfig {
            run_tests: false,
            run_lint: false,
            ..WorkflowConfig::default()
        };
        let runner = ScriptedRunner::new(vec!["npm"]);
        let results = run_checks(&config, &runner).await;
        assert!(results.all_passed());
        assert!(runner.calls.lock().unwrap().is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_shell_runner_exit_status() {
        let dir = tempfile::TempDir::new().unwrap();
        let runner = ShellRunner::new(dir.path());

        let ok = runner.run("echo hello").await;
        assert!(ok.success);
        assert_eq!(ok.stdout, "hello");

        let failed = runner.run("echo oops >&2; exit 3").await;
        assert!(!failed.success);
        assert_eq!(failed.stderr, "oops");
    }
}
