//! `code_buddy info`: repository summary.

use owo_colors::OwoColorize;

use crate::error::Error;
use crate::git::GitOps;
use crate::ui::{self, HeaderMode};

pub async fn run() -> Result<(), Error> {
    ui::print_header("📊 code_buddy - Repository Information", HeaderMode::Banner);

    let root = super::current_dir()?;
    let git = super::open_repository(&root).await?;

    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string());
    ui::success(&format!("📁 Repository: {}", name.bold()));

    match git.remote_url().await {
        Some(url) => ui::success(&format!("🌐 Origin: {}", url)),
        None => ui::warn("🌐 Origin: Not configured"),
    }

    let branch = git.current_branch().await?;
    ui::success(&format!("📍 Current branch: {}", branch.bold()));

    match git.last_commit().await {
        Some(commit) => ui::success(&format!("📝 Last commit: {}", commit)),
        None => ui::warn("📝 Last commit: No commits yet"),
    }

    match git.commit_count().await {
        0 => ui::warn("📈 Total commits: 0"),
        count => ui::success(&format!("📈 Total commits: {}", count)),
    }

    Ok(())
}
