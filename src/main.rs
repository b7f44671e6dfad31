//! mturkish: Mechanical Turk requester CLI

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::builder::FalseyValueParser;
use clap::{ArgAction, Parser};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use mturkish::commands::{Command, Session};
use mturkish::config::{ClientConfig, DEFAULT_MAX_ITEMS};
use mturkish::service::MturkService;

/// Create, review and clean up Mechanical Turk HITs
///
/// Global options go before the subcommand.
#[derive(Parser)]
#[command(name = "mturkish")]
#[command(version)]
struct Cli {
    /// AWS profile to use
    #[arg(long, short, env = "MTURKISH_PROFILE")]
    profile: Option<String>,

    /// Use the requester sandbox
    #[arg(long, short, env = "MTURKISH_SANDBOX", value_parser = FalseyValueParser::new())]
    sandbox: bool,

    /// Maximum number of items fetched by any listing
    #[arg(long, short, env = "MTURKISH_MAX_ITEMS", default_value_t = DEFAULT_MAX_ITEMS)]
    max_items: usize,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(long, short, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = ClientConfig::new(cli.profile, cli.sandbox, cli.max_items);
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(config, cli.command))
}

async fn run(config: ClientConfig, command: Command) -> Result<()> {
    tracing::debug!(environment = %config.environment, profile = ?config.profile, "connecting");
    let service = MturkService::from_config(&config).await;
    let session = Session::new(Arc::new(service), &config);

    let name = command.name();
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    command
        .execute(&session, stdin.lock(), &mut out)
        .await
        .with_context(|| format!("{name} failed"))?;
    out.flush()?;
    Ok(())
}

/// Logs go to stderr; stdout carries command output only.
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}
