//! The Executor
//!
//! This module handles settlement of expired battles:
//! - Simulation: record what would be settled, never touch the chain
//! - Dry run: eth_call `settleBattle` from the agent address
//! - Production: sign and send `settleBattle`
//!
//! ⚠️  WARNING: Production mode sends real transactions!
//! Run in dry-run mode against the target network first.

mod signer;

pub use signer::AgentWallet;

use alloy_primitives::{B256, U256};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::arena::ArenaChain;
use crate::config::{Config, ExecutionMode};

/// The settlement engine
pub struct SettlementEngine {
    chain: Arc<dyn ArenaChain>,
    mode: ExecutionMode,
    emergency_stop: bool,
}

impl SettlementEngine {
    pub fn new(chain: Arc<dyn ArenaChain>, config: &Config) -> Self {
        Self {
            chain,
            mode: config.execution_mode,
            emergency_stop: config.emergency_stop,
        }
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Production mode with a key to sign with
    pub fn is_production_ready(&self) -> bool {
        self.mode == ExecutionMode::Production && self.chain.agent_address().is_some()
    }

    /// Settle one battle according to the execution mode. Never returns Err:
    /// every failure is folded into the result so batch callers can count it.
    pub async fn settle(&self, battle_id: U256) -> SettlementResult {
        // Safety checks
        if self.emergency_stop {
            warn!("🛑 Emergency stop active - not settling battle {}", battle_id);
            return SettlementResult::Aborted {
                reason: "Emergency stop is active".to_string(),
            };
        }

        match self.mode {
            ExecutionMode::Simulation => {
                info!("📋 SIMULATION MODE: Would settle battle {}", battle_id);
                SettlementResult::Simulated
            }

            ExecutionMode::DryRun => {
                info!("🔬 DRY RUN MODE: Simulating settleBattle({})...", battle_id);
                match self.chain.simulate_settle(battle_id).await {
                    Ok(()) => {
                        info!("✅ settleBattle({}) would succeed", battle_id);
                        SettlementResult::DryRun {
                            passed: true,
                            revert: None,
                        }
                    }
                    Err(e) => {
                        warn!("❌ settleBattle({}) would revert: {}", battle_id, e);
                        SettlementResult::DryRun {
                            passed: false,
                            revert: Some(e.to_string()),
                        }
                    }
                }
            }

            ExecutionMode::Production => {
                if !self.is_production_ready() {
                    return SettlementResult::Aborted {
                        reason: "Production requires AGENT_PRIVATE_KEY".to_string(),
                    };
                }

                info!("🚀 PRODUCTION MODE: Settling battle {}", battle_id);
                match self.chain.settle(battle_id).await {
                    Ok(tx_hash) => SettlementResult::Submitted { tx_hash },
                    Err(e) => {
                        error!("Settlement of battle {} failed: {:#}", battle_id, e);
                        SettlementResult::Failed {
                            reason: e.to_string(),
                        }
                    }
                }
            }
        }
    }
}

/// Result of a settlement attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SettlementResult {
    /// Simulation mode; nothing sent
    Simulated,

    /// Dry run via eth_call
    DryRun {
        passed: bool,
        revert: Option<String>,
    },

    /// Transaction sent (production mode)
    Submitted { tx_hash: B256 },

    /// Aborted (safety/config issue)
    Aborted { reason: String },

    Failed { reason: String },
}

impl SettlementResult {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            SettlementResult::Simulated
                | SettlementResult::DryRun { passed: true, .. }
                | SettlementResult::Submitted { .. }
        )
    }

    pub fn tx_hash(&self) -> Option<B256> {
        match self {
            SettlementResult::Submitted { tx_hash } => Some(*tx_hash),
            _ => None,
        }
    }
}

impl std::fmt::Display for SettlementResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettlementResult::Simulated => write!(f, "would settle (simulation)"),
            SettlementResult::DryRun { passed: true, .. } => write!(f, "dry run passed"),
            SettlementResult::DryRun { revert, .. } => write!(
                f,
                "dry run reverted: {}",
                revert.as_deref().unwrap_or("unknown reason")
            ),
            SettlementResult::Submitted { tx_hash } => write!(f, "submitted {}", tx_hash),
            SettlementResult::Aborted { reason } => write!(f, "aborted: {}", reason),
            SettlementResult::Failed { reason } => write!(f, "failed: {}", reason),
        }
    }
}
