//! Commit message generation.
//!
//! Remote providers are tried in priority order. When none has a usable
//! credential or all of them fail, the message is built from diff statistics.

pub mod gemini;
pub mod openai;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::Error;
use crate::git::DiffStats;
use crate::ui;

pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

/// Message used when there is nothing more specific to say.
pub const FALLBACK_SUBJECT: &str = "Update files";

/// Longest commit message accepted from a provider.
pub const MAX_MESSAGE_LEN: usize = 200;

/// Diffs are cut to this many bytes before being sent to a provider.
const MAX_DIFF_BYTES: usize = 16 * 1024;

/// Instructions shared by the conventional-commit providers.
pub(crate) const CONVENTIONAL_PROMPT: &str = "Based on the following git diff, generate a concise, conventional commit message.
The message should:
- Follow conventional commit format (type: description)
- Be under 50 characters for the subject line
- Clearly describe what changed
- Use present tense";

pub(crate) const LOCAL_LANGUAGE_PROMPT: &str = "Based on the following git diff, generate a concise commit message.
The message should:
- Be brief and clear
- Describe what changed
- Support local languages (Afaan Oromo, Amharic) if appropriate";

/// Build the user prompt for a diff.
pub(crate) fn build_prompt(instructions: &str, diff: &str) -> String {
    format!(
        "{}\n\nGit diff:\n{}\n\nGenerate only the commit message, nothing else.",
        instructions,
        truncate_diff(diff)
    )
}

fn truncate_diff(diff: &str) -> &str {
    if diff.len() <= MAX_DIFF_BYTES {
        return diff;
    }
    let mut end = MAX_DIFF_BYTES;
    while !diff.is_char_boundary(end) {
        end -= 1;
    }
    &diff[..end]
}

/// A backend that turns a diff into a commit message.
#[async_trait]
pub trait MessageProvider: Send + Sync {
    /// Display name.
    fn name(&self) -> &str;

    async fn generate(&self, diff: &str) -> Result<String, Error>;
}

/// Static description of a supported provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderSpec {
    pub id: &'static str,
    pub name: &'static str,
    pub env_key: &'static str,
    pub model: &'static str,
}

/// Supported providers in priority order.
pub const PROVIDERS: &[ProviderSpec] = &[
    ProviderSpec {
        id: "openai",
        name: "OpenAI",
        env_key: "OPENAI_API_KEY",
        model: "gpt-3.5-turbo",
    },
    ProviderSpec {
        id: "gemini",
        name: "Gemini",
        env_key: "GEMINI_API_KEY",
        model: "gemini-2.5-flash",
    },
    ProviderSpec {
        id: "addisai",
        name: "Addis AI",
        env_key: "ADDIS_AI_API_KEY",
        model: "addis-ai-local",
    },
];

/// Reject blank keys and template placeholders such as `your_api_key`.
pub fn is_usable_key(key: &str) -> bool {
    let key = key.trim();
    !key.is_empty() && !key.starts_with("your_") && !key.contains("placeholder")
}

fn build_provider(spec: &ProviderSpec, api_key: String) -> Box<dyn MessageProvider> {
    match spec.id {
        "gemini" => Box::new(GeminiProvider::new(api_key, spec.model)),
        "addisai" => Box::new(OpenAiProvider::addis(api_key, spec.model)),
        _ => Box::new(OpenAiProvider::openai(api_key, spec.model)),
    }
}

/// Providers with a usable key, looked up through `lookup`.
pub fn providers_from(lookup: impl Fn(&str) -> Option<String>) -> Vec<Box<dyn MessageProvider>> {
    PROVIDERS
        .iter()
        .filter_map(|spec| {
            let key = lookup(spec.env_key).filter(|k| is_usable_key(k))?;
            debug!(provider = spec.name, "Provider credential found");
            Some(build_provider(spec, key.trim().to_string()))
        })
        .collect()
}

/// Providers with a usable key in the environment.
pub fn providers_from_env() -> Vec<Box<dyn MessageProvider>> {
    providers_from(|key| std::env::var(key).ok())
}

/// Each provider and whether its credential is usable.
pub fn provider_availability() -> Vec<(ProviderSpec, bool)> {
    PROVIDERS
        .iter()
        .map(|spec| {
            let available = std::env::var(spec.env_key)
                .map(|k| is_usable_key(&k))
                .unwrap_or(false);
            (*spec, available)
        })
        .collect()
}

/// Non-empty and at most [`MAX_MESSAGE_LEN`] characters once trimmed.
pub fn validate_commit_message(message: &str) -> bool {
    let trimmed = message.trim();
    !trimmed.is_empty() && trimmed.chars().count() <= MAX_MESSAGE_LEN
}

/// Deterministic message built from line counts.
pub fn fallback_message(stats: DiffStats) -> String {
    if stats.is_empty() {
        return FALLBACK_SUBJECT.to_string();
    }

    let mut parts = Vec::new();
    if stats.added > 0 {
        parts.push(format!("{} lines added", stats.added));
    }
    if stats.removed > 0 {
        parts.push(format!("{} lines removed", stats.removed));
    }
    format!("{} — {}", FALLBACK_SUBJECT, parts.join(", "))
}

/// Picks the commit message for a diff.
pub struct CommitMessageGenerator {
    use_ai: bool,
    providers: Vec<Box<dyn MessageProvider>>,
}

impl CommitMessageGenerator {
    pub fn new(use_ai: bool, providers: Vec<Box<dyn MessageProvider>>) -> Self {
        Self { use_ai, providers }
    }

    /// Generator that never calls a provider.
    pub fn offline() -> Self {
        Self::new(false, Vec::new())
    }

    pub async fn generate(&self, diff: &str) -> String {
        if diff.trim().is_empty() {
            return FALLBACK_SUBJECT.to_string();
        }

        let stats = DiffStats::from_diff(diff);
        if !self.use_ai {
            return fallback_message(stats);
        }

        if self.providers.is_empty() {
            ui::warn("⚠️  No AI API keys found in environment, using fallback");
            return fallback_message(stats);
        }

        for provider in &self.providers {
            ui::step(&format!(
                "🤖 Generating AI commit message using {}...",
                provider.name()
            ));
            match provider.generate(diff).await {
                Ok(message) if validate_commit_message(&message) => {
                    ui::success(&format!("✅ {} commit message generated", provider.name()));
                    return message.trim().to_string();
                }
                Ok(message) => {
                    warn!(
                        provider = provider.name(),
                        len = message.len(),
                        "Rejected provider message"
                    );
                    ui::warn(&format!(
                        "⚠️  {} response was empty or too long",
                        provider.name()
                    ));
                }
                Err(e) => {
                    warn!(provider = provider.name(), error = %e, "Provider failed");
                    ui::failure(&format!("❌ AI generation failed: {}", e));
                }
            }
        }

        ui::warn("🔄 Using fallback commit message");
        fallback_message(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const DIFF: &str = "--- a/x\n+++ b/x\n+one\n+two\n";

    struct FakeProvider {
        name: &'static str,
        reply: Result<&'static str, &'static str>,
        calls: Arc<AtomicUsize>,
    }

    impl FakeProvider {
        fn boxed(
            name: &'static str,
            reply: Result<&'static str, &'static str>,
            calls: &Arc<AtomicUsize>,
        ) -> Box<dyn MessageProvider> {
            Box::new(Self {
                name,
                reply,
                calls: Arc::clone(calls),
            })
        }
    }

    #[async_trait]
    impl MessageProvider for FakeProvider {
        fn name(&self) -> &str {
            self.name
        }

        async fn generate(&self, _diff: &str) -> Result<String, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply
                .map(str::to_string)
                .map_err(|e| Error::provider(self.name, e))
        }
    }

    #[test]
    fn test_fallback_messages() {
        assert_eq!(fallback_message(DiffStats::default()), "Update files");
        assert_eq!(
            fallback_message(DiffStats {
                added: 2,
                removed: 0
            }),
            "Update files — 2 lines added"
        );
        assert_eq!(
            fallback_message(DiffStats {
                added: 0,
                removed: 4
            }),
            "Update files — 4 lines removed"
        );
        assert_eq!(
            fallback_message(DiffStats {
                added: 5,
                removed: 1
            }),
            "Update files — 5 lines added, 1 lines removed"
        );
    }

    #[tokio::test]
    async fn test_empty_diff_is_update_files() {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = FakeProvider::boxed("A", Ok("feat: x"), &calls);
        let generator = CommitMessageGenerator::new(true, vec![provider]);
        assert_eq!(generator.generate("  \n").await, "Update files");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_offline_uses_stats() {
        let generator = CommitMessageGenerator::offline();
        assert_eq!(generator.generate(DIFF).await, "Update files — 2 lines added");
    }

    #[tokio::test]
    async fn test_ai_without_providers_falls_back() {
        let generator = CommitMessageGenerator::new(true, Vec::new());
        assert_eq!(generator.generate(DIFF).await, "Update files — 2 lines added");
    }

    #[tokio::test]
    async fn test_first_working_provider_wins() {
        let calls = Arc::new(AtomicUsize::new(0));
        let generator = CommitMessageGenerator::new(
            true,
            vec![
                FakeProvider::boxed("A", Err("connection refused"), &calls),
                FakeProvider::boxed("B", Ok("  feat: add numbers\n"), &calls),
                FakeProvider::boxed("C", Ok("never used"), &calls),
            ],
        );
        assert_eq!(generator.generate(DIFF).await, "feat: add numbers");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_all_providers_fail_falls_back() {
        let calls = Arc::new(AtomicUsize::new(0));
        let generator = CommitMessageGenerator::new(
            true,
            vec![
                FakeProvider::boxed("A", Err("timeout"), &calls),
                FakeProvider::boxed("B", Ok("   "), &calls),
            ],
        );
        assert_eq!(generator.generate(DIFF).await, "Update files — 2 lines added");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_usable_keys() {
        assert!(is_usable_key("sk-abc123"));
        assert!(!is_usable_key(""));
        assert!(!is_usable_key("   "));
        assert!(!is_usable_key("your_openai_key"));
        assert!(!is_usable_key("gemini-placeholder"));
    }

    #[test]
    fn test_providers_in_priority_order() {
        let env: HashMap<&str, &str> = [
            ("ADDIS_AI_API_KEY", "addis-key"),
            ("GEMINI_API_KEY", "gem-key"),
            ("OPENAI_API_KEY", "your_key_here"),
        ]
        .into_iter()
        .collect();

        let providers = providers_from(|k| env.get(k).map(|v| v.to_string()));
        let names: Vec<&str> = providers.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["Gemini", "Addis AI"]);
    }

    #[test]
    fn test_validate_commit_message() {
        assert!(validate_commit_message("fix: handle empty diff"));
        assert!(!validate_commit_message("  "));
        assert!(!validate_commit_message(&"x".repeat(MAX_MESSAGE_LEN + 1)));
    }

    #[test]
    fn test_prompt_truncates_large_diff() {
        let diff = "+é".repeat(MAX_DIFF_BYTES);
        let prompt = build_prompt(CONVENTIONAL_PROMPT, &diff);
        assert!(prompt.len() < MAX_DIFF_BYTES + 1024);
        assert!(prompt.ends_with("Generate only the commit message, nothing else."));
    }
}
