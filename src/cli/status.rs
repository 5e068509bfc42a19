//! `code_buddy status`: branch, working tree changes and unpushed commits.

use owo_colors::OwoColorize;

use crate::error::Error;
use crate::git::{parse_porcelain, GitOps, StatusKind};
use crate::ui::{self, HeaderMode};

/// Icon for a porcelain status kind.
pub fn status_icon(kind: StatusKind) -> String {
    match kind {
        StatusKind::Modified => "📝".yellow().to_string(),
        StatusKind::Added => "➕".green().to_string(),
        StatusKind::Deleted => "➖".red().to_string(),
        StatusKind::Renamed => "🔄".blue().to_string(),
        StatusKind::Copied => "📋".blue().to_string(),
        StatusKind::Unmerged => "⚠️ ".red().to_string(),
        StatusKind::Untracked | StatusKind::Unknown => "❓".dimmed().to_string(),
    }
}

pub async fn run() -> Result<(), Error> {
    ui::print_header("🔍 code_buddy - Enhanced Status", HeaderMode::Banner);

    let root = super::current_dir()?;
    let git = super::open_repository(&root).await?;

    let branch = git.current_branch().await?;
    ui::success(&format!("📍 Current branch: {}", branch.bold()));

    let status = git.status().await?;
    let entries = parse_porcelain(&status);
    if entries.is_empty() {
        ui::success("✅ Working directory clean");
    } else {
        ui::warn("📝 Changes detected:");
        for entry in &entries {
            println!("   {} {}", status_icon(entry.kind()), entry.path);
        }
    }

    // no upstream for the branch means nothing to report
    if let Some(count) = git.unpushed_count(&branch).await.filter(|c| *c > 0) {
        println!("\n{}", format!("📤 Unpushed commits: {}", count).cyan());
    }

    Ok(())
}
