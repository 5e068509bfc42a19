//! code_buddy - a git assistant with a commit-on-save watcher.

use std::time::Duration;

use clap::Parser;
use owo_colors::OwoColorize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use code_buddy::cli::{self, Cli, Commands};
use code_buddy::Error;

fn init_logging(verbose: bool) {
    let directive = if verbose {
        "code_buddy=debug"
    } else {
        "code_buddy=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

async fn dispatch(command: Commands) -> Result<(), Error> {
    match command {
        Commands::Status => cli::status::run().await,
        Commands::Info => cli::info::run().await,
        Commands::Branch { remote, all } => {
            cli::branch::run(cli::branch::scope(remote, all)).await
        }
        Commands::Watch(args) => cli::watch::run(args).await,
        Commands::SshSetup { email } => cli::ssh::run(email).await,
        Commands::Providers => cli::providers::run(),
    }
}

/// Grace period for blocking tasks at exit. A stdin read abandoned by a
/// shutdown at the prompt never finishes on its own.
const BLOCKING_GRACE: Duration = Duration::from_millis(100);

fn main() {
    let cli = Cli::parse();
    init_logging(cli.command.is_verbose());

    // API keys may live in a local .env
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "Loaded .env");
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("{}", format!("❌ Error: failed to start runtime: {}", e).red());
            std::process::exit(1);
        }
    };

    let result = runtime.block_on(dispatch(cli.command));
    runtime.shutdown_timeout(BLOCKING_GRACE);

    if let Err(e) = result {
        eprintln!("{}", format!("❌ Error: {}", e).red());
        std::process::exit(1);
    }
}
