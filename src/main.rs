//! Arena Agent - LP Battle Arena monitor and settler
//!
//! Run with: cargo run -- <command>
//!
//! Commands:
//! - status / analyze / settle: one-shot operations against the arena
//! - run: polling loop that settles expired battles
//! - serve: polling loop plus the dashboard API
//! - quote / attestation / burn: LI.FI and Circle CCTP routing

use clap::Parser;
use color_eyre::eyre::Result;
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod agent;
mod analysis;
mod arena;
mod bridge;
mod cli;
mod config;
mod decimal;
mod executor;
mod server;

use cli::Cli;

fn print_banner() {
    println!();
    println!(
        "{}",
        style("═══════════════════════════════════════════════════════════════").cyan()
    );
    println!(
        "{}",
        style(" ⚔️  ARENA AGENT - LP Battle Monitor & Settler").cyan().bold()
    );
    println!(
        "{}",
        style("    Uniswap V4 + Camelot | Auto-settle | LI.FI + CCTP routing").cyan()
    );
    println!(
        "{}",
        style("═══════════════════════════════════════════════════════════════").cyan()
    );
    println!();
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "arena_agent=info".into()),
        )
        .init();

    let cli = Cli::parse();

    print_banner();

    cli::execute(cli).await
}
