//! Agent Configuration
//!
//! All runtime parameters for the arena agent, loaded from the environment
//! (with `.env` support) or from a TOML file. Writes to the chain are gated by
//! the execution mode and the emergency stop.

use alloy_primitives::Address;
use eyre::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

// ============================================
// EXECUTION MODE
// ============================================

/// Execution mode determines what the agent does with a settlement decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ExecutionMode {
    /// Simulation mode - analyzes and records decisions but never touches the chain
    #[default]
    Simulation,

    /// DryRun mode - eth_calls the settlement to see if it would revert
    DryRun,

    /// Production mode - signs and sends settlement transactions
    /// CAUTION: This spends gas from the agent wallet!
    Production,
}

impl ExecutionMode {
    fn parse(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "production" | "live" => ExecutionMode::Production,
            "dry_run" | "dryrun" => ExecutionMode::DryRun,
            _ => ExecutionMode::Simulation,
        }
    }
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionMode::Simulation => write!(f, "SIMULATION"),
            ExecutionMode::DryRun => write!(f, "DRY_RUN"),
            ExecutionMode::Production => write!(f, "PRODUCTION"),
        }
    }
}

// ============================================
// ROUTE CHECK
// ============================================

/// Optional cross-chain route the agent quotes once per cycle
/// (e.g. topping the agent wallet up with USDC on the arena chain)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteCheck {
    pub from_chain: u64,
    pub to_chain: u64,
    pub from_token: String,
    pub to_token: String,
    /// Amount in the token's smallest unit, as a decimal string
    pub amount: String,
}

// ============================================
// MAIN CONFIGURATION
// ============================================

/// Main configuration struct for the arena agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // ========== Network Settings ==========
    /// RPC URL of the chain the arena is deployed on
    pub rpc_url: String,

    /// Chain ID (42161 = Arbitrum One)
    pub chain_id: u64,

    // ========== Contracts ==========
    /// BattleArena contract address
    pub battle_arena_address: Option<String>,

    /// Uniswap V4 PoolManager (storage is read directly)
    pub pool_manager_address: Option<String>,

    /// Stylus leaderboard contract (optional, for ELO projections)
    pub leaderboard_address: Option<String>,

    /// ERC-4626 vaults to summarize
    pub vault_addresses: Vec<String>,

    // ========== Execution Settings ==========
    /// Current execution mode
    pub execution_mode: ExecutionMode,

    /// Agent signing key (KEEP SECRET!) - only needed for production
    pub agent_private_key: Option<String>,

    /// Kill switch - never send or simulate writes while set
    pub emergency_stop: bool,

    // ========== Loop Settings ==========
    /// Seconds between poll cycles
    pub poll_interval_secs: u64,

    /// Entry score above which a pending battle is flagged
    pub entry_score_threshold: u8,

    /// Maximum entries kept in the in-memory log buffer
    pub log_buffer_size: usize,

    // ========== HTTP ==========
    /// Port for the dashboard API
    pub http_port: u16,

    // ========== Routing Services ==========
    /// LI.FI API base URL
    pub lifi_api_url: String,

    /// LI.FI API key (optional, raises rate limits)
    pub lifi_api_key: Option<String>,

    /// Circle attestation service base URL
    pub cctp_attestation_url: String,

    /// Route quoted every cycle (disabled when None)
    pub route_check: Option<RouteCheck>,
}

impl Config {
    /// Load configuration from environment variables and .env file
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        Ok(Self {
            // Network
            rpc_url: env::var("RPC_URL").unwrap_or(defaults.rpc_url),
            chain_id: env::var("CHAIN_ID")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.chain_id),

            // Contracts
            battle_arena_address: env::var("BATTLE_ARENA_ADDRESS").ok(),
            pool_manager_address: env::var("POOL_MANAGER_ADDRESS").ok(),
            leaderboard_address: env::var("LEADERBOARD_ADDRESS").ok(),
            vault_addresses: env::var("VAULT_ADDRESSES")
                .map(|s| Self::split_list(&s))
                .unwrap_or_default(),

            // Execution
            execution_mode: ExecutionMode::parse(
                &env::var("EXECUTION_MODE").unwrap_or_else(|_| "simulation".to_string()),
            ),
            agent_private_key: env::var("AGENT_PRIVATE_KEY").ok(),
            emergency_stop: env::var("EMERGENCY_STOP")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(false),

            // Loop
            poll_interval_secs: env::var("POLL_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.poll_interval_secs),
            entry_score_threshold: env::var("ENTRY_SCORE_THRESHOLD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.entry_score_threshold),
            log_buffer_size: env::var("LOG_BUFFER_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.log_buffer_size),

            // HTTP
            http_port: env::var("HTTP_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.http_port),

            // Routing
            lifi_api_url: env::var("LIFI_API_URL").unwrap_or(defaults.lifi_api_url),
            lifi_api_key: env::var("LIFI_API_KEY").ok(),
            cctp_attestation_url: env::var("CCTP_ATTESTATION_URL")
                .unwrap_or(defaults.cctp_attestation_url),
            route_check: Self::route_check_from_env(),
        })
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    fn split_list(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }

    /// The route check is only enabled when every ROUTE_* variable is set
    fn route_check_from_env() -> Option<RouteCheck> {
        Some(RouteCheck {
            from_chain: env::var("ROUTE_FROM_CHAIN").ok()?.parse().ok()?,
            to_chain: env::var("ROUTE_TO_CHAIN").ok()?.parse().ok()?,
            from_token: env::var("ROUTE_FROM_TOKEN").ok()?,
            to_token: env::var("ROUTE_TO_TOKEN").ok()?,
            amount: env::var("ROUTE_AMOUNT").ok()?,
        })
    }

    fn parse_address(label: &str, raw: &Option<String>) -> Result<Option<Address>> {
        raw.as_deref()
            .map(|s| {
                Address::from_str(s.trim())
                    .map_err(|e| eyre::eyre!("Invalid {}: {} ({})", label, s, e))
            })
            .transpose()
    }

    /// BattleArena address, required by every arena command
    pub fn arena_address(&self) -> Result<Address> {
        Self::parse_address("BATTLE_ARENA_ADDRESS", &self.battle_arena_address)?
            .ok_or_else(|| eyre::eyre!("BATTLE_ARENA_ADDRESS is not set"))
    }

    pub fn pool_manager(&self) -> Result<Option<Address>> {
        Self::parse_address("POOL_MANAGER_ADDRESS", &self.pool_manager_address)
    }

    pub fn leaderboard(&self) -> Result<Option<Address>> {
        Self::parse_address("LEADERBOARD_ADDRESS", &self.leaderboard_address)
    }

    /// Vault addresses that parse; malformed entries are skipped
    pub fn vaults(&self) -> Vec<Address> {
        self.vault_addresses
            .iter()
            .filter_map(|s| Address::from_str(s).ok())
            .collect()
    }

    /// Validate configuration before the agent starts
    pub fn validate(&self) -> Result<()> {
        if self.rpc_url.is_empty() || self.rpc_url.contains("YOUR_API_KEY") {
            return Err(eyre::eyre!("Invalid RPC_URL - please set a valid RPC endpoint"));
        }

        self.arena_address()?;
        self.pool_manager()?;
        self.leaderboard()?;

        if self.execution_mode == ExecutionMode::Production && self.agent_private_key.is_none() {
            return Err(eyre::eyre!("Production mode requires AGENT_PRIVATE_KEY"));
        }

        if self.poll_interval_secs == 0 {
            return Err(eyre::eyre!("POLL_INTERVAL_SECS must be at least 1"));
        }
        if self.entry_score_threshold > 100 {
            return Err(eyre::eyre!(
                "ENTRY_SCORE_THRESHOLD must be within 0-100 (currently {})",
                self.entry_score_threshold
            ));
        }

        Ok(())
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        let set = |v: bool| if v { "✓ Configured" } else { "✗ Not Set" };

        println!("╔════════════════════════════════════════════════════════════╗");
        println!("║              ARENA AGENT - CONFIGURATION                   ║");
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ Execution Mode:    {:^40} ║", self.execution_mode);
        println!("║ Chain ID:          {:^40} ║", self.chain_id);
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ CONTRACTS                                                  ║");
        println!("║ • BattleArena:     {:^40} ║", set(self.battle_arena_address.is_some()));
        println!("║ • PoolManager:     {:^40} ║", set(self.pool_manager_address.is_some()));
        println!("║ • Leaderboard:     {:^40} ║", set(self.leaderboard_address.is_some()));
        println!("║ • Vaults:          {:^40} ║", self.vault_addresses.len());
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ LOOP                                                       ║");
        println!("║ • Poll Interval:   {:>38}s ║", self.poll_interval_secs);
        println!("║ • Entry Threshold: {:^40} ║", self.entry_score_threshold);
        println!("║ • HTTP Port:       {:^40} ║", self.http_port);
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ SAFETY                                                     ║");
        println!("║ • Agent Key:       {:^40} ║", set(self.agent_private_key.is_some()));
        println!(
            "║ • Emergency Stop:  {:^40} ║",
            if self.emergency_stop { "🛑 ACTIVE" } else { "✓ Inactive" }
        );
        println!(
            "║ • Route Check:     {:^40} ║",
            if self.route_check.is_some() { "✓ Enabled" } else { "✗ Disabled" }
        );
        println!("╚════════════════════════════════════════════════════════════╝");
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_url: "https://arb1.arbitrum.io/rpc".to_string(),
            chain_id: 42161,
            battle_arena_address: None,
            pool_manager_address: None,
            leaderboard_address: None,
            vault_addresses: vec![],
            execution_mode: ExecutionMode::Simulation,
            agent_private_key: None,
            emergency_stop: false,
            poll_interval_secs: 60,
            entry_score_threshold: 60,
            log_buffer_size: 500,
            http_port: 3001,
            lifi_api_url: "https://li.quest/v1".to_string(),
            lifi_api_key: None,
            cctp_attestation_url: "https://iris-api.circle.com/v1".to_string(),
            route_check: None,
        }
    }
}

// ============================================
// TESTS
// ============================================
