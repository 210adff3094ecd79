//! Command-line surface
//!
//! Every command returns `Err` on failure so the process exits non-zero.

use alloy_primitives::{Address, B256, U256};
use clap::{Parser, Subcommand};
use console::style;
use eyre::{eyre, Result, WrapErr};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use crate::agent::Agent;
use crate::analysis::scoring::DexKind;
use crate::analysis::{BattleAnalysis, Side};
use crate::bridge::cctp::{message_hash, BurnRequest};
use crate::bridge::{AttestationClient, AttestationStatus, LifiClient, LifiQuote, QuoteRequest};
use crate::config::Config;
use crate::executor::AgentWallet;
use crate::server;

#[derive(Parser, Debug)]
#[command(author, version, about = "LP Battle Arena monitoring and settlement agent")]
pub struct Cli {
    /// TOML config file (default: environment / .env)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print agent and chain status
    Status,

    /// Analyze one battle, or every active and pending battle
    Analyze {
        /// Battle id
        id: Option<String>,
        #[arg(long, conflicts_with = "id")]
        all: bool,
    },

    /// Settle one expired battle, or every expired battle
    Settle {
        id: Option<String>,
        #[arg(long, conflicts_with = "id")]
        all: bool,
    },

    /// Run the polling loop
    Run,

    /// Run the polling loop and the dashboard API
    Serve {
        /// Overrides HTTP_PORT
        #[arg(long)]
        port: Option<u16>,
    },

    /// Fetch a LI.FI swap/bridge quote
    Quote {
        #[arg(long)]
        from_chain: u64,
        #[arg(long)]
        to_chain: u64,
        #[arg(long)]
        from_token: String,
        #[arg(long)]
        to_token: String,
        /// Amount in the token's smallest unit
        #[arg(long)]
        amount: String,
        /// Defaults to the agent wallet
        #[arg(long)]
        from_address: Option<String>,
    },

    /// Look up a Circle CCTP attestation
    Attestation {
        /// keccak256 of the MessageSent payload
        #[arg(long, required_unless_present = "message", conflicts_with = "message")]
        hash: Option<String>,
        /// Raw MessageSent payload (hex); hashed locally
        #[arg(long)]
        message: Option<String>,
    },

    /// Assemble CCTP depositForBurn calldata (nothing is sent)
    Burn {
        /// Defaults to CHAIN_ID
        #[arg(long)]
        from_chain: Option<u64>,
        #[arg(long)]
        to_chain: u64,
        /// USDC amount in base units (6 decimals)
        #[arg(long)]
        amount: String,
        #[arg(long)]
        recipient: String,
        /// USDC address on the source chain
        #[arg(long)]
        token: String,
    },
}

// ============================================
// PARSING HELPERS
// ============================================

fn parse_id(raw: &str) -> Result<U256> {
    U256::from_str(raw.trim()).map_err(|_| eyre!("Invalid battle id: {}", raw))
}

fn parse_amount(raw: &str) -> Result<U256> {
    U256::from_str(raw.trim()).map_err(|_| eyre!("Invalid amount: {}", raw))
}

fn parse_address(label: &str, raw: &str) -> Result<Address> {
    Address::from_str(raw.trim()).map_err(|_| eyre!("Invalid {} address: {}", label, raw))
}

fn short(addr: &Address) -> String {
    let full = format!("{:?}", addr);
    format!("{}…{}", &full[..6], &full[full.len() - 4..])
}

fn duration(secs: u64) -> String {
    match secs {
        s if s >= 86_400 => format!("{}d {}h", s / 86_400, (s % 86_400) / 3_600),
        s if s >= 3_600 => format!("{}h {}m", s / 3_600, (s % 3_600) / 60),
        s if s >= 60 => format!("{}m {}s", s / 60, s % 60),
        s => format!("{}s", s),
    }
}

// ============================================
// RENDERING
// ============================================

fn in_range_mark(flag: Option<bool>) -> String {
    match flag {
        Some(true) => style("in range").green().to_string(),
        Some(false) => style("out of range").red().to_string(),
        None => style("unknown").dim().to_string(),
    }
}

/// Lines printed by `analyze` for one battle
pub fn render_analysis(a: &BattleAnalysis, threshold: u8) -> Vec<String> {
    let b = &a.battle;
    let mut lines = vec![
        style(format!("═══ Battle #{} ═══", b.id)).cyan().bold().to_string(),
        format!(
            "  Status:     {} ({} battle on {})",
            b.status,
            b.battle_type,
            DexKind::from_u8(b.dex_type)
                .map(|d| d.to_string())
                .unwrap_or_else(|| format!("dex {}", b.dex_type))
        ),
        format!(
            "  Creator:    {}  ticks [{}, {}]  {}",
            short(&b.creator),
            b.creator_range.lower,
            b.creator_range.upper,
            in_range_mark(a.creator_in_range)
        ),
    ];

    if b.has_opponent() {
        lines.push(format!(
            "  Opponent:   {}  ticks [{}, {}]  {}",
            short(&b.opponent),
            b.opponent_range.lower,
            b.opponent_range.upper,
            in_range_mark(a.opponent_in_range)
        ));
    } else {
        lines.push(format!("  Opponent:   {}", style("open").yellow()));
    }

    match a.pool {
        Some(pool) => lines.push(format!(
            "  Pool:       tick {}  price {:.6}  fee {:.2}%",
            pool.tick,
            pool.price(),
            pool.lp_fee_pct()
        )),
        None => lines.push(format!("  Pool:       {}", style("state unavailable").dim())),
    }

    lines.push(format!(
        "  Time:       {} remaining{}",
        duration(a.time_remaining),
        if a.is_expired {
            style(" (EXPIRED)").red().bold().to_string()
        } else {
            String::new()
        }
    ));

    if b.has_opponent() {
        let p = &a.win_probability;
        lines.push(format!(
            "  Win odds:   creator {:.1}% / opponent {:.1}%",
            p.creator * 100.0,
            p.opponent * 100.0
        ));
        lines.push(format!("              {}", style(&p.rationale).dim()));

        let leader = match a.projected_leader {
            Some(Side::Creator) => "creator",
            Some(Side::Opponent) => "opponent",
            None => "none yet",
        };
        lines.push(format!("  Leader:     {}", leader));
    }

    if let Some(ref elo) = a.elo {
        lines.push(format!(
            "  ELO:        {} vs {}  (at stake: +{} / +{})",
            elo.creator, elo.opponent, elo.creator_gain, elo.opponent_gain
        ));
    }

    lines.push(format!("  Resolver:   {} reward", a.resolver_reward));
    lines.push(format!("  Entry:      {}/100", a.entry_score));

    let rec = if a.worth_entering(threshold) || a.is_expired {
        style(&a.recommendation).green().bold()
    } else {
        style(&a.recommendation).white()
    };
    lines.push(format!("  → {}", rec));
    lines
}

fn render_quote(q: &LifiQuote) -> Vec<String> {
    let a = &q.action;
    let mut lines = vec![
        style(format!(
            "═══ LI.FI quote: {} {} (chain {}) → {} (chain {}) ═══",
            a.from_amount, a.from_token.symbol, a.from_chain_id, a.to_token.symbol, a.to_chain_id
        ))
        .cyan()
        .bold()
        .to_string(),
        format!("  Tool:       {}", q.tool),
        format!(
            "  Output:     {} (min {})",
            q.estimate.to_amount,
            q.estimate.to_amount_min.as_deref().unwrap_or("-")
        ),
        format!("  Gas cost:   ${:.2}", q.gas_cost_usd()),
    ];
    if let Some(secs) = q.estimate.execution_duration {
        lines.push(format!("  Duration:   ~{}", duration(secs.max(0.0) as u64)));
    }
    if let Some(ref tx) = q.transaction_request {
        lines.push(format!("  Send to:    {}", tx.to.as_deref().unwrap_or("-")));
    }
    lines
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

// ============================================
// COMMANDS
// ============================================

pub fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path)
            .wrap_err_with(|| format!("Failed to load config from {}", path.display())),
        None => Config::from_env(),
    }
}

pub async fn execute(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Command::Status => status(config).await,
        Command::Analyze { id, all } => analyze(config, id, all).await,
        Command::Settle { id, all } => settle(config, id, all).await,
        Command::Run => {
            config.print_summary();
            Agent::from_config(config)?.run().await
        }
        Command::Serve { port } => serve(config, port).await,
        Command::Quote {
            from_chain,
            to_chain,
            from_token,
            to_token,
            amount,
            from_address,
        } => {
            let from_address = match from_address {
                Some(raw) => parse_address("sender", &raw)?,
                None => AgentWallet::from_config(&config)?
                    .address()
                    .ok_or_else(|| eyre!("--from-address is required without AGENT_PRIVATE_KEY"))?,
            };
            let request = QuoteRequest {
                from_chain,
                to_chain,
                from_token,
                to_token,
                from_amount: parse_amount(&amount)?,
                from_address,
            };
            let client = LifiClient::new(&config.lifi_api_url, config.lifi_api_key.clone())?;
            let quote = client.quote(&request).await?;
            print_lines(&render_quote(&quote));
            Ok(())
        }
        Command::Attestation { hash, message } => attestation(config, hash, message).await,
        Command::Burn {
            from_chain,
            to_chain,
            amount,
            recipient,
            token,
        } => {
            let burn = BurnRequest::new(
                from_chain.unwrap_or(config.chain_id),
                to_chain,
                parse_amount(&amount)?,
                parse_address("recipient", &recipient)?,
                parse_address("token", &token)?,
            )?;
            print_lines(&render_burn(&burn));
            Ok(())
        }
    }
}

async fn status(config: Config) -> Result<()> {
    config.print_summary();
    let agent = Agent::from_config(config)?;
    let status = agent.status().await;

    println!();
    println!("{}", style("═══ AGENT STATUS ═══").cyan().bold());
    println!("  Version:         {}", status.version);
    println!("  Mode:            {}", status.mode);
    match status.block_number {
        Some(block) => println!("  Block:           {} {}", style("✓").green(), block),
        None => println!("  Block:           {} RPC unreachable", style("✗").red()),
    }
    match status.agent {
        Some(agent) => println!("  Agent:           {:?}", agent),
        None => println!("  Agent:           {}", style("read-only (no key)").yellow()),
    }
    let count = |c: Option<usize>| c.map(|n| n.to_string()).unwrap_or_else(|| "?".to_string());
    println!("  Active battles:  {}", count(status.active_battles));
    println!("  Pending battles: {}", count(status.pending_battles));

    for vault in agent.vault_summaries().await {
        println!(
            "  Vault {}:  {} assets / {} shares (price {:.4})",
            vault.name,
            vault.total_assets,
            vault.total_supply,
            vault.share_price()
        );
    }

    if status.block_number.is_none() {
        return Err(eyre!("RPC {} is unreachable", agent.config().rpc_url));
    }
    Ok(())
}

async fn analyze(config: Config, id: Option<String>, all: bool) -> Result<()> {
    let threshold = config.entry_score_threshold;
    let agent = Agent::from_config(config)?;

    let analyses = match (id, all) {
        (Some(id), _) => vec![agent.analyze(parse_id(&id)?).await?],
        (None, true) => agent.analyze_all().await?,
        (None, false) => return Err(eyre!("Pass a battle id or --all")),
    };

    if analyses.is_empty() {
        println!("{}", style("No active or pending battles.").yellow());
    }
    for analysis in &analyses {
        print_lines(&render_analysis(analysis, threshold));
        println!();
    }
    Ok(())
}

async fn settle(config: Config, id: Option<String>, all: bool) -> Result<()> {
    let agent = Agent::from_config(config)?;
    println!(
        "{} Execution mode: {}",
        style("⚖️").cyan(),
        style(agent.config().execution_mode).bold()
    );

    match (id, all) {
        (Some(id), _) => {
            let result = agent.settle(parse_id(&id)?).await?;
            println!("{} Battle {}: {}", style("✓").green(), id, result);
            Ok(())
        }
        (None, true) => {
            let ids = agent.expired_battles().await?;
            if ids.is_empty() {
                println!("{}", style("No expired battles to settle.").yellow());
                return Ok(());
            }

            let pb = ProgressBar::new(ids.len() as u64);
            pb.set_style(
                ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );

            let outcome = agent
                .settle_all(&ids, |id, result| {
                    let mark = if result.is_success() {
                        style("✓").green()
                    } else {
                        style("✗").red()
                    };
                    pb.println(format!("{} Battle {}: {}", mark, id, result));
                    pb.inc(1);
                })
                .await;
            pb.finish_and_clear();

            println!(
                "Settled {}/{} ({} failed)",
                outcome.succeeded, outcome.attempted, outcome.failed
            );
            if outcome.failed > 0 {
                return Err(eyre!("{} settlement(s) failed", outcome.failed));
            }
            Ok(())
        }
        (None, false) => Err(eyre!("Pass a battle id or --all")),
    }
}

async fn serve(config: Config, port: Option<u16>) -> Result<()> {
    config.print_summary();
    let port = port.unwrap_or(config.http_port);
    let agent = Arc::new(Agent::from_config(config)?);

    let poller = agent.clone();
    tokio::select! {
        result = poller.run() => result,
        result = server::serve(agent, port) => result,
    }
}

async fn attestation(config: Config, hash: Option<String>, message: Option<String>) -> Result<()> {
    let hash = match (hash, message) {
        (Some(raw), _) => B256::from_str(raw.trim()).map_err(|_| eyre!("Invalid hash: {}", raw))?,
        (None, Some(raw)) => {
            let bytes = hex::decode(raw.trim().trim_start_matches("0x")).map_err(|_| eyre!("Message is not valid hex"))?;
            message_hash(&bytes)
        }
        (None, None) => return Err(eyre!("Pass --hash or --message")),
    };

    let client = AttestationClient::new(&config.cctp_attestation_url)?;
    println!("Message hash: {}", hash);
    match client.fetch(hash).await? {
        AttestationStatus::Complete { attestation } => {
            println!("{} Attestation ready", style("✓").green());
            println!("{}", attestation);
            Ok(())
        }
        AttestationStatus::Pending { detail } => {
            println!("{} Pending: {}", style("…").yellow(), detail);
            Ok(())
        }
        AttestationStatus::NotFound => Err(eyre!("Circle has no record of message {}", hash)),
    }
}

fn render_burn(burn: &BurnRequest) -> Vec<String> {
    let route = burn.to_route_record();
    vec![
        style("═══ CCTP depositForBurn ═══").cyan().bold().to_string(),
        format!("  Source chain:  {}", burn.source_chain),
        format!("  Destination:   {}", burn.destination),
        format!("  Amount:        {}", burn.amount),
        format!("  Recipient:     {}", burn.mint_recipient()),
        format!("  Burn token:    {:?}", burn.burn_token),
        format!(
            "  Route:         {} {} -> {} via {}",
            route.provider,
            route.from_chain,
            route.to_chain,
            route.tool.as_deref().unwrap_or("-")
        ),
        format!("  Calldata:      0x{}", hex::encode(burn.calldata())),
    ]
}
