//! The Shop CLI - browse, authenticate, manage a wishlist and place orders.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! shop products --category electronics
//! shop product 3
//!
//! # Sign in (the token is kept in SHOP_TOKEN_FILE between runs)
//! shop login --email ada@example.com --password secret1
//! shop whoami
//!
//! # Order two of product 1 and one of product 4
//! shop order --item 1:2 --item 4
//!
//! # Interactive session with a cart
//! shop shell
//! ```
//!
//! # Commands
//!
//! - `health`, `categories`, `products`, `product` - Catalog
//! - `login`, `register`, `logout`, `whoami` - Account
//! - `wishlist`, `review`, `order`, `orders`, `profile` - Signed-in actions
//! - `shell` - Interactive session with cart commands

#![cfg_attr(not(test), forbid(unsafe_code))]

mod commands;
mod error;
mod render;
mod shell;

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use the_shop_client::{ClientConfig, FileTokenStore, MemoryTokenStore, SessionManager, TokenStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::ShopCommand;
use crate::error::CliError;

#[derive(Parser)]
#[command(name = "shop")]
#[command(author, version, about = "The Shop command-line client")]
struct Cli {
    /// Keep the login token in memory only
    #[arg(long, global = true)]
    no_persist: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Shop(ShopCommand),
    /// Start an interactive session
    Shell,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN | tracing::Level::INFO => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Logs go to stderr so command output on stdout stays clean.
fn init_tracing(json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "the_shop_client=info,shop=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
        }))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = ClientConfig::from_env();

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);
    init_tracing(cli.log_json);

    let result = match config {
        Ok(config) => run(cli, &config).await,
        Err(e) => Err(CliError::from(e)),
    };

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &ClientConfig) -> Result<(), CliError> {
    let tokens: Box<dyn TokenStore> = if cli.no_persist {
        Box::new(MemoryTokenStore::new())
    } else {
        Box::new(FileTokenStore::new(&config.token_file))
    };
    let mut manager = SessionManager::new(config, tokens)?;
    let mut out = std::io::stdout().lock();

    match cli.command {
        Commands::Shop(command) => commands::execute(&mut manager, command, &mut out).await,
        Commands::Shell => shell::run(&mut manager, &mut out).await,
    }
}
