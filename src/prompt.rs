//! Interactive terminal prompts.

use std::io::{self, BufRead, Write};

use async_trait::async_trait;
use owo_colors::OwoColorize;

/// Asks the user questions.
#[async_trait]
pub trait Prompt: Send + Sync {
    /// Yes/no question. Empty input picks `default`.
    async fn confirm(&self, question: &str, default: bool) -> bool;

    /// Free-text question. Empty input picks `default`.
    async fn ask_text(&self, question: &str, default: &str) -> String;
}

/// Interpret a yes/no answer. `None` means the input was not understood.
pub fn parse_yes_no(input: &str, default: bool) -> Option<bool> {
    match input.trim().to_lowercase().as_str() {
        "" => Some(default),
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// Reads answers from stdin.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPrompt;

impl TerminalPrompt {
    /// Print `prompt` and read one line. `None` on EOF or a read error.
    fn read_line(prompt: &str) -> Option<String> {
        print!("{}", prompt.cyan());
        io::stdout().flush().ok()?;

        let mut input = String::new();
        match io::stdin().lock().read_line(&mut input) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(input),
        }
    }
}

#[async_trait]
impl Prompt for TerminalPrompt {
    async fn confirm(&self, question: &str, default: bool) -> bool {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        let prompt = format!("{} {} ", question, hint);

        tokio::task::spawn_blocking(move || loop {
            let Some(input) = Self::read_line(&prompt) else {
                println!();
                return default;
            };
            match parse_yes_no(&input, default) {
                Some(answer) => return answer,
                None => println!("{}", "Please answer with y/yes or n/no".yellow()),
            }
        })
        .await
        .unwrap_or(default)
    }

    async fn ask_text(&self, question: &str, default: &str) -> String {
        let prompt = if default.is_empty() {
            format!("{}: ", question)
        } else {
            format!("{} [{}]: ", question, default)
        };
        let fallback = default.to_string();

        let answer = tokio::task::spawn_blocking(move || Self::read_line(&prompt))
            .await
            .ok()
            .flatten()
            .map(|input| input.trim().to_string())
            .filter(|input| !input.is_empty());

        answer.unwrap_or(fallback)
    }
}
