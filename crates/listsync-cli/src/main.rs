use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::context::Context;

#[derive(Parser)]
#[command(
    name = "listsync",
    version,
    about = "Keep the race mailing list in step with registrations"
)]
struct Cli {
    /// Config file (default: $LISTSYNC_CONFIG or ~/.config/listsync/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Contact cache file, overriding the configured path
    #[arg(long, global = true)]
    cache: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show contact lists other than the registered and unregistered ones
    Lists {
        /// Delete every non-reserved list
        #[arg(long)]
        prune: bool,
        /// With --prune, only report what would be deleted
        #[arg(long, requires = "prune")]
        dry_run: bool,
    },
    /// Refresh the contact cache from the remote collection
    Contacts,
    /// Print cached contacts as EMAIL, FNAME, LNAME rows
    Output,
    /// Add every cached contact to the unregistered list
    Load,
    /// Subscribe registrants to the registered list
    Update {
        /// Registration export (default: latest file in the downloads directory)
        #[arg(long)]
        file: Option<PathBuf>,
        /// Print the planned creates and updates without sending them
        #[arg(long)]
        dry_run: bool,
    },
    /// Registration export files
    Exports {
        #[command(subcommand)]
        action: commands::exports::ExportsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// API credential management
    Auth {
        #[command(subcommand)]
        action: commands::auth::AuthAction,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, stopping after the current request");
            on_interrupt.cancel();
        }
    });

    let result = run(cli, cancel).await;

    if let Err(e) = result {
        eprintln!("{}", report(e.as_ref()));
        std::process::exit(1);
    }
}

async fn run(cli: Cli, cancel: CancellationToken) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = commands::context::config_path(cli.config)?;
    // config and auth stay usable when the config file does not parse
    let load = || Context::load(config_path.clone(), cli.cache.clone(), cancel.clone());

    match cli.command {
        Commands::Lists { prune, dry_run } => {
            let ctx = load()?;
            commands::lists::run(&ctx, prune, dry_run).await
        }
        Commands::Contacts => {
            let ctx = load()?;
            commands::contacts::sync(&ctx).await
        }
        Commands::Output => commands::contacts::output(&load()?),
        Commands::Load => {
            let ctx = load()?;
            commands::contacts::load(&ctx).await
        }
        Commands::Update { file, dry_run } => {
            let ctx = load()?;
            commands::update::run(&ctx, file, dry_run).await
        }
        Commands::Exports { action } => {
            let ctx = load()?;
            commands::exports::run(&ctx, action).await
        }
        Commands::Config { action } => commands::config::run(&config_path, action),
        Commands::Auth { action } => commands::auth::run(action),
    }
}

/// Error message followed by each underlying cause not already part of it.
fn report(err: &dyn std::error::Error) -> String {
    let mut out = format!("error: {err}");
    let mut shown = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !shown.contains(&text) {
            out.push_str(&format!("\n  caused by: {text}"));
        }
        shown = text;
        source = cause.source();
    }
    out
}
