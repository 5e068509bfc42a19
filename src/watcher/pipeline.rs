//! The commit workflow run for each debounced batch.
//!
//! status → checks → diff → message → confirm → add/commit/push.
//! Every step can end the run early; nothing is retried.

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use owo_colors::OwoColorize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::checks::{run_checks, CheckRunner};
use crate::config::WorkflowConfig;
use crate::error::Error;
use crate::git::{DiffKind, DiffStats, GitOps};
use crate::message::CommitMessageGenerator;
use crate::prompt::Prompt;
use crate::ui;
use crate::watcher::debouncer::{ChangeHandler, ChangeKind, FileEvent};

/// Git step that ended a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Status,
    Stage,
    Commit,
    Push,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Status => "status",
            Self::Stage => "stage",
            Self::Commit => "commit",
            Self::Push => "push",
        };
        f.write_str(name)
    }
}

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// Working tree clean, or git had nothing to commit.
    NoChanges,
    ChecksFailed,
    /// The user answered no, or shutdown began before git was touched.
    Declined,
    Committed { message: String },
    Failed { step: Step, error: Error },
}

/// Runs the pipeline against a fixed config snapshot.
pub struct Workflow {
    config: WorkflowConfig,
    git: Box<dyn GitOps>,
    checks: Box<dyn CheckRunner>,
    messages: CommitMessageGenerator,
    prompt: Box<dyn Prompt>,
    verbose: bool,
    shutdown: Option<watch::Receiver<bool>>,
}

impl Workflow {
    pub fn new(
        config: WorkflowConfig,
        git: Box<dyn GitOps>,
        checks: Box<dyn CheckRunner>,
        messages: CommitMessageGenerator,
        prompt: Box<dyn Prompt>,
    ) -> Self {
        Self {
            config,
            git,
            checks,
            messages,
            prompt,
            verbose: false,
            shutdown: None,
        }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Stop at the prompt, and before any git write, once `shutdown` turns true.
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    fn stopping(&self) -> bool {
        self.shutdown.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolves once shutdown is signalled. Never resolves without a channel.
    async fn stopped(&self) {
        if let Some(mut rx) = self.shutdown.clone() {
            let signalled = rx.wait_for(|stop| *stop).await.is_ok();
            if signalled {
                return;
            }
        }
        std::future::pending::<()>().await
    }

    /// Run the workflow once for `changes`.
    pub async fn run(&self, changes: &[PathBuf]) -> RunOutcome {
        debug!(files = changes.len(), "Processing batch");
        println!("\n{}", "🔄 Processing file changes...".blue());

        match self.git.status().await {
            Ok(status) if status.trim().is_empty() => {
                ui::warn("⚠️  No git changes detected, skipping workflow");
                return RunOutcome::NoChanges;
            }
            Ok(_) => {}
            Err(error) => return RunOutcome::Failed { step: Step::Status, error },
        }

        println!("\n{}", "📋 Running quality checks...".blue());
        let results = run_checks(&self.config, self.checks.as_ref()).await;
        if !results.all_passed() {
            ui::failure("\n❌ Quality checks failed, skipping git operations");
            return RunOutcome::ChecksFailed;
        }
        ui::success("\n✅ All quality checks passed!");

        let diff = match self.git.diff(DiffKind::Unstaged).await {
            Ok(diff) => diff,
            Err(e) => {
                warn!(error = %e, "Diff failed, continuing with empty diff");
                ui::failure(&format!("❌ Failed to get unstaged diff: {}", e));
                String::new()
            }
        };
        let stats = DiffStats::from_diff(&diff);

        println!("\n{}", "💭 Generating commit message...".blue());
        let message = self.messages.generate(&diff).await;

        if !self.confirm(stats, &message).await {
            ui::warn("\n⏭️  Skipping commit and push");
            return RunOutcome::Declined;
        }
        if self.stopping() {
            ui::warn("\n⏭️  Shutting down, skipping commit and push");
            return RunOutcome::Declined;
        }

        println!("\n{}", "🚀 Starting git workflow...".blue());
        self.commit_and_push(message).await
    }

    async fn confirm(&self, stats: DiffStats, message: &str) -> bool {
        let details = vec![
            format!(
                "📊 Changes: {} lines added, {} lines removed",
                stats.added, stats.removed
            )
            .green()
            .to_string(),
            format!("💬 Commit message: \"{}\"", message).blue().to_string(),
            format!("🌿 Target branch: {}", self.config.branch)
                .dimmed()
                .to_string(),
        ];

        if self.config.auto_confirm {
            println!("\n{}", "📦 Auto-confirming commit and push...".blue());
            for detail in &details {
                println!("{}", detail);
            }
            return true;
        }

        ui::detail_block("📦 Ready to commit and push", &details);
        tokio::select! {
            answer = self.prompt.confirm("Commit and push now?", true) => answer,
            _ = self.stopped() => {
                debug!("Shutdown while waiting for confirmation");
                false
            }
        }
    }

    async fn commit_and_push(&self, message: String) -> RunOutcome {
        ui::step("📦 Staging all changes...");
        if let Err(error) = self.git.stage_all().await {
            ui::failure(&format!("❌ Failed to stage changes:\n{}", error));
            return RunOutcome::Failed { step: Step::Stage, error };
        }
        ui::success("✅ All changes staged");

        ui::step("💾 Committing changes...");
        match self.git.commit(&message).await {
            Ok(_) => ui::success("✅ Changes committed"),
            Err(Error::NoChanges) => {
                ui::warn("🤷 No changes to commit.");
                return RunOutcome::NoChanges;
            }
            Err(error) => {
                ui::failure(&format!("❌ Failed to commit:\n{}", error));
                return RunOutcome::Failed { step: Step::Commit, error };
            }
        }

        let branch = &self.config.branch;
        ui::step(&format!("🚀 Pushing to {}...", branch));
        if let Err(error) = self.git.push(branch).await {
            ui::failure(&format!("❌ Failed to push:\n{}", error));
            return RunOutcome::Failed { step: Step::Push, error };
        }
        ui::success("✅ Changes pushed");

        RunOutcome::Committed { message }
    }
}

#[async_trait]
impl ChangeHandler for Workflow {
    fn on_event(&self, event: &FileEvent) {
        let line = format!(
            "{} {}: {}",
            event.kind.icon(),
            event.kind.label(),
            event.path.display()
        );
        match event.kind {
            ChangeKind::Added => println!("{}", line.green()),
            ChangeKind::Modified => println!("{}", line.yellow()),
            ChangeKind::Deleted => println!("{}", line.red()),
        }
        if self.verbose {
            ui::muted(&format!("   Time: {}", chrono::Local::now().format("%H:%M:%S")));
        }
    }

    async fn handle(&self, changes: Vec<PathBuf>) {
        match self.run(&changes).await {
            RunOutcome::Committed { message } => {
                info!(%message, "Committed and pushed");
                println!(
                    "\n{}",
                    "🎉 Successfully committed and pushed changes!".green().bold()
                );
            }
            RunOutcome::Failed { step, error } => {
                warn!(%step, error = %error, "Workflow run failed");
                ui::failure(&format!("\n❌ Error processing changes: {}", error));
            }
            outcome => debug!(?outcome, "Workflow run ended early"),
        }
        println!("\n{}\n", "👀 Watching for more changes...".blue());
    }
}
