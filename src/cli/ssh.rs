//! `code_buddy ssh-setup`: generate an ed25519 key for GitHub.

use std::fs;
use std::path::{Path, PathBuf};

use owo_colors::OwoColorize;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::Error;
use crate::git::Git;
use crate::prompt::{Prompt, TerminalPrompt};
use crate::ui::{self, HeaderMode};

/// File name of the generated private key.
pub const KEY_NAME: &str = "code_buddy_id_ed25519";

/// `ssh-add -l` exits with 2 when it cannot reach an agent.
const AGENT_UNREACHABLE: i32 = 2;

/// Manages the key pair under an `.ssh` directory.
#[derive(Debug, Clone)]
pub struct SshKeyManager {
    ssh_dir: PathBuf,
}

impl SshKeyManager {
    /// Manager for `~/.ssh`.
    pub fn new() -> Result<Self, Error> {
        let home = dirs::home_dir().ok_or(Error::HomeDirNotFound)?;
        Ok(Self::with_dir(home.join(".ssh")))
    }

    pub fn with_dir(ssh_dir: impl Into<PathBuf>) -> Self {
        Self {
            ssh_dir: ssh_dir.into(),
        }
    }

    pub fn private_key_path(&self) -> PathBuf {
        self.ssh_dir.join(KEY_NAME)
    }

    pub fn public_key_path(&self) -> PathBuf {
        self.ssh_dir.join(format!("{}.pub", KEY_NAME))
    }

    pub fn key_exists(&self) -> bool {
        self.private_key_path().exists() || self.public_key_path().exists()
    }

    /// Files in the ssh directory other than `known_hosts*`, sorted.
    pub fn existing_keys(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.ssh_dir) else {
            return Vec::new();
        };
        let mut keys: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| !name.starts_with("known_hosts"))
            .collect();
        keys.sort();
        keys
    }

    fn ensure_dir(&self) -> Result<(), Error> {
        if self.ssh_dir.is_dir() {
            return Ok(());
        }
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }
        builder.create(&self.ssh_dir)?;
        debug!(path = %self.ssh_dir.display(), "Created ssh directory");
        Ok(())
    }

    /// Generate the key pair and return the public key.
    pub async fn generate(&self, email: &str) -> Result<String, Error> {
        self.ensure_dir()?;
        if self.key_exists() {
            return Err(Error::SshKeyExists(self.private_key_path()));
        }

        ui::step("🔐 Generating new SSH key pair...");
        let private_key = self.private_key_path().to_string_lossy().into_owned();
        run_tool(
            "ssh-keygen",
            &["-t", "ed25519", "-f", private_key.as_str(), "-C", email, "-N", ""],
        )
        .await?;
        info!(path = %private_key, "Generated SSH key");

        Ok(fs::read_to_string(self.public_key_path())?.trim().to_string())
    }

    /// Add the private key to a running ssh-agent.
    pub async fn add_to_agent(&self) -> Result<(), String> {
        if let Err(Error::CommandFailed {
            code: Some(AGENT_UNREACHABLE),
            ..
        }) = run_tool("ssh-add", &["-l"]).await
        {
            return Err("ssh-agent is not running. Please start it manually.".to_string());
        }

        let private_key = self.private_key_path().to_string_lossy().into_owned();
        run_tool("ssh-add", &[private_key.as_str()])
            .await
            .map(|_| ())
            .map_err(|e| format!("Failed to add key to ssh-agent: {}", e))
    }
}

/// Run an external tool, returning stdout.
async fn run_tool(program: &str, args: &[&str]) -> Result<String, Error> {
    debug!(program, ?args, "Running ssh tool");
    let output = Command::new(program).args(args).output().await?;
    if output.status.success() {
        return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
    }
    Err(Error::CommandFailed {
        command: program.to_string(),
        code: output.status.code(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}

fn print_instructions(public_key: &str, key_path: &Path) {
    println!("\n{}\n", "🎉 SSH Key Setup Complete!".green().bold());
    ui::step("📋 Your new public key:");
    println!("{}", public_key.yellow());
    ui::muted(&format!("   (saved at {})", key_path.display()));
    println!("\n{}", "🔗 Next steps:".cyan());
    println!("1. Copy the public key above");
    println!("2. Go to GitHub SSH settings: https://github.com/settings/keys");
    println!("3. Click \"New SSH key\"");
    println!("4. Paste your key and give it a title");
    println!("5. Click \"Add SSH key\"\n");
    ui::muted("💡 You can test your connection with: ssh -T git@github.com");
}

pub async fn run(email: Option<String>) -> Result<(), Error> {
    ui::print_header("🔐 code_buddy - SSH Key Setup", HeaderMode::Banner);

    let manager = SshKeyManager::new()?;
    let existing = manager.existing_keys();
    if !existing.is_empty() {
        ui::step("📋 Existing SSH keys found:");
        for key in &existing {
            ui::muted(&format!("  - {}", key));
        }
    }

    let email = match email.filter(|e| !e.trim().is_empty()) {
        Some(email) => email,
        None => {
            let git = Git::new(super::current_dir()?);
            let default = git.user_email().await.unwrap_or_default();
            TerminalPrompt
                .ask_text("📧 Enter your email address for the SSH key", &default)
                .await
        }
    };
    if email.trim().is_empty() {
        return Err(Error::MissingEmail);
    }

    let public_key = manager.generate(email.trim()).await?;
    if let Err(message) = manager.add_to_agent().await {
        ui::warn(&format!("⚠️  Warning: {}", message));
    }
    print_instructions(&public_key, &manager.public_key_path());

    Ok(())
}
