//! `code_buddy branch`: branches sorted by last commit.

use owo_colors::OwoColorize;

use crate::error::Error;
use crate::git::{BranchEntry, BranchScope};
use crate::ui::{self, HeaderMode};

/// Scope selected by the `-r`/`-a` flags. `--all` wins.
pub fn scope(remote: bool, all: bool) -> BranchScope {
    if all {
        BranchScope::All
    } else if remote {
        BranchScope::Remote
    } else {
        BranchScope::Local
    }
}

/// One display line for a branch.
pub fn format_branch(entry: &BranchEntry) -> String {
    if entry.current {
        format!("👉 {} (current)", entry.name.bold())
            .green()
            .to_string()
    } else if entry.remote {
        format!("🌐 {}", entry.name).cyan().to_string()
    } else {
        format!("📍 {}", entry.name)
    }
}

pub async fn run(scope: BranchScope) -> Result<(), Error> {
    ui::print_header("🌿 code_buddy - Branch Information", HeaderMode::Banner);

    let root = super::current_dir()?;
    let git = super::open_repository(&root).await?;

    let branches = git.branches(scope).await?;
    if branches.is_empty() {
        ui::warn("No branches found");
    }
    for entry in &branches {
        println!("{}", format_branch(entry));
    }

    Ok(())
}
