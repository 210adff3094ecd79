//! ERC-4626 vault summaries for the dashboard.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultSummary {
    pub address: Address,
    pub name: String,
    pub asset: Address,
    #[serde(with = "crate::decimal")]
    pub total_assets: U256,
    #[serde(with = "crate::decimal")]
    pub total_supply: U256,
    /// Shares held by the agent wallet (None without a configured key)
    #[serde(with = "crate::decimal::option")]
    pub agent_shares: Option<U256>,
}

impl VaultSummary {
    /// Assets per share; 1.0 for an empty vault
    pub fn share_price(&self) -> f64 {
        if self.total_supply.is_zero() {
            return 1.0;
        }
        let assets: f64 = self.total_assets.to_string().parse().unwrap_or(0.0);
        let supply: f64 = self.total_supply.to_string().parse().unwrap_or(1.0);
        assets / supply
    }
}
