//! `code_buddy watch`: commit and push as files change.

use owo_colors::OwoColorize;
use tokio::sync::watch;
use tracing::info;

use super::WatchArgs;
use crate::checks::ShellRunner;
use crate::config::{Config, WatchOverrides, WorkflowConfig};
use crate::error::Error;
use crate::message::{providers_from_env, CommitMessageGenerator};
use crate::prompt::TerminalPrompt;
use crate::ui::{self, HeaderMode};
use crate::watcher::{Debouncer, FileWatcher, IgnoreMatcher, WatchBackend, Workflow};

impl From<&WatchArgs> for WatchOverrides {
    fn from(args: &WatchArgs) -> Self {
        Self {
            use_ai: args.use_ai,
            no_tests: args.no_tests,
            no_lint: args.no_lint,
            yes: args.yes,
            ignore: args.ignore.clone(),
        }
    }
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    ui::warn("\n🛑 Stopping file watcher...");
}

fn print_summary(config: &WorkflowConfig, verbose: bool) {
    ui::print_header("👀 code_buddy - File Watcher", HeaderMode::Compact);
    if verbose {
        ui::muted("Verbose mode enabled");
    }
    ui::success("📁 Watching current directory for changes...");
    ui::muted(&format!("🚫 Ignoring: {}", config.ignore.join(", ")));

    println!("\n{}", "⚙️  Configuration:".blue());
    ui::muted(&format!("   Tests: {}", ui::tick(config.run_tests)));
    ui::muted(&format!("   Linting: {}", ui::tick(config.run_lint)));
    ui::muted(&format!("   AI Commits: {}", ui::tick(config.use_ai)));
    ui::muted(&format!("   Auto-confirm: {}", ui::tick(config.auto_confirm)));
    ui::muted(&format!("   Branch: {}", config.branch));
    println!();
}

pub async fn run(args: WatchArgs) -> Result<(), Error> {
    let root = super::current_dir()?;
    let git = super::open_repository(&root).await?;

    let loaded = Config::load(&root)?;
    if loaded.is_legacy() {
        if let Some(path) = &loaded.path {
            ui::warn(&format!(
                "⚠️  Using legacy config {}. Please rename it to .code_buddyrc.json",
                path.display()
            ));
        }
    }
    let config = WorkflowConfig::resolve(loaded.config, &WatchOverrides::from(&args));
    print_summary(&config, args.verbose);

    let ignore = IgnoreMatcher::new(&config.ignore)?;
    let backend = if args.poll {
        WatchBackend::Poll
    } else {
        WatchBackend::Native
    };
    let (mut watcher, events) = FileWatcher::new(&root, ignore, backend)?;
    watcher.start()?;

    let (stop_tx, stop_rx) = watch::channel(false);
    let messages = CommitMessageGenerator::new(config.use_ai, providers_from_env());
    let workflow = Workflow::new(
        config,
        Box::new(git),
        Box::new(ShellRunner::new(&root)),
        messages,
        Box::new(TerminalPrompt),
    )
    .verbose(args.verbose)
    .with_shutdown(stop_rx);

    ui::warn("Press Ctrl+C to stop watching...\n");
    info!(?backend, root = %root.display(), "Watch started");

    let shutdown = async move {
        shutdown_signal().await;
        // unblocks a run waiting at the confirmation prompt
        let _ = stop_tx.send(true);
    };
    Debouncer::default().run(events, &workflow, shutdown).await;

    drop(watcher);
    ui::success("✅ File watcher stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_from_args() {
        let args = WatchArgs {
            use_ai: true,
            no_tests: true,
            ignore: vec!["build/**".to_string()],
            ..WatchArgs::default()
        };
        let config = WorkflowConfig::resolve(Config::default(), &WatchOverrides::from(&args));

        assert!(config.use_ai);
        assert!(!config.run_tests);
        assert!(config.run_lint);
        assert!(!config.auto_confirm);
        assert_eq!(config.ignore.last().map(String::as_str), Some("build/**"));
    }
}
