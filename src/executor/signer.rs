//! Agent Wallet - settlement signing key
//!
//! This module handles:
//! - Loading the agent's private key from config
//! - Exposing the address settlements are sent from
//! - Building the alloy wallet for the signing provider
//!
//! ⚠️  SECURITY WARNING:
//! - Never log or expose private keys
//! - Use environment variables, not hardcoded keys

use alloy_network::EthereumWallet;
use alloy_primitives::Address;
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use eyre::{eyre, Result};
use std::str::FromStr;
use tracing::{debug, info};

use crate::config::Config;

/// Agent key holder; an empty wallet can still read and simulate
#[derive(Clone, Default)]
pub struct AgentWallet {
    signer: Option<PrivateKeySigner>,
}

impl std::fmt::Debug for AgentWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentWallet")
            .field("address", &self.address())
            .finish()
    }
}

impl AgentWallet {
    /// Load AGENT_PRIVATE_KEY from config. A key that does not parse is an error.
    pub fn from_config(config: &Config) -> Result<Self> {
        match config.agent_private_key.as_deref() {
            Some(key) if !key.trim().is_empty() => {
                let mut wallet = Self::from_key(key)?;
                wallet.bind_chain(config.chain_id);
                info!("✓ Agent wallet loaded: {:?}", wallet.address());
                Ok(wallet)
            }
            _ => {
                debug!("AGENT_PRIVATE_KEY not set (read-only agent)");
                Ok(Self::default())
            }
        }
    }

    pub fn from_key(key: &str) -> Result<Self> {
        let key = key.trim().trim_start_matches("0x");
        let signer = PrivateKeySigner::from_str(key)
            .map_err(|_| eyre!("AGENT_PRIVATE_KEY is not a valid secp256k1 key"))?;
        Ok(Self {
            signer: Some(signer),
        })
    }

    /// Sign with EIP-155 replay protection for this chain
    pub fn bind_chain(&mut self, chain_id: u64) {
        if let Some(signer) = self.signer.as_mut() {
            signer.set_chain_id(Some(chain_id));
        }
    }

    pub fn chain_id(&self) -> Option<u64> {
        self.signer.as_ref().and_then(|s| s.chain_id())
    }

    pub fn address(&self) -> Option<Address> {
        self.signer.as_ref().map(|s| s.address())
    }

    /// Wallet for `ProviderBuilder::wallet`
    pub fn ethereum_wallet(&self) -> Option<EthereumWallet> {
        self.signer.clone().map(EthereumWallet::from)
    }
}
