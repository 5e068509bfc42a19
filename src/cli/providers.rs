//! `code_buddy providers`: which AI backends have credentials.

use owo_colors::OwoColorize;

use crate::error::Error;
use crate::message::{provider_availability, ProviderSpec};
use crate::ui::{self, HeaderMode};

fn format_provider(spec: &ProviderSpec, available: bool) -> String {
    let state = if available {
        "configured".green().to_string()
    } else {
        "missing".dimmed().to_string()
    };
    format!(
        "{} {:<10} {:<18} {:<16} {}",
        ui::tick(available),
        spec.name,
        spec.env_key,
        spec.model,
        state
    )
}

pub fn run() -> Result<(), Error> {
    ui::print_header("🤖 code_buddy - AI Providers", HeaderMode::Compact);

    let providers = provider_availability();
    for (spec, available) in &providers {
        println!("{}", format_provider(spec, *available));
    }

    if providers.iter().any(|(_, available)| *available) {
        ui::muted("\nProviders are tried in the order above. Enable with `code_buddy watch --use-ai`.");
    } else {
        ui::warn("\n⚠️  No AI API keys found. Commit messages will use the diff summary.");
        ui::muted("Set one of the variables above in your shell or a .env file.");
    }

    Ok(())
}
