//! Arena chain access.
//!
//! `ArenaChain` is the seam between the agent and the network: every contract
//! read and the single settlement write go through it. `RpcArena` is the
//! alloy-backed implementation.

use alloy_primitives::{Address, B256, U256};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_rpc_types::TransactionRequest;
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use eyre::{eyre, Result};
use tracing::{debug, info};

use super::battle::Battle;
use super::contracts::{IBattleArena, IERC4626, ILeaderboard};
use super::vaults::VaultSummary;
use crate::config::Config;
use crate::executor::AgentWallet;

/// Read and write primitives the agent needs from the arena chain
#[async_trait]
pub trait ArenaChain: Send + Sync {
    async fn active_battle_ids(&self) -> Result<Vec<U256>>;
    async fn pending_battle_ids(&self) -> Result<Vec<U256>>;
    async fn expired_battle_ids(&self) -> Result<Vec<U256>>;
    /// None when the arena has no battle with this id
    async fn battle(&self, id: U256) -> Result<Option<Battle>>;
    async fn is_expired(&self, id: U256) -> Result<bool>;

    /// Raw 256-bit word from PoolManager storage
    async fn pool_storage(&self, slot: B256) -> Result<U256>;

    /// Leaderboard rating; None when no leaderboard is configured
    async fn elo(&self, player: Address) -> Result<Option<U256>>;

    async fn vault_summary(&self, vault: Address) -> Result<VaultSummary>;
    async fn block_number(&self) -> Result<u64>;

    /// Address settlements are sent from
    fn agent_address(&self) -> Option<Address>;

    /// eth_call `settleBattle` from the agent address; Err carries the revert
    async fn simulate_settle(&self, id: U256) -> Result<()>;

    /// Sign and send `settleBattle`, returning the transaction hash
    async fn settle(&self, id: U256) -> Result<B256>;
}

/// Alloy provider-backed arena access
pub struct RpcArena {
    provider: DynProvider,
    signer_provider: Option<DynProvider>,
    agent: Option<Address>,
    arena: Address,
    pool_manager: Option<Address>,
    leaderboard: Option<Address>,
}

impl RpcArena {
    pub fn new(config: &Config, wallet: &AgentWallet) -> Result<Self> {
        let provider = ProviderBuilder::new()
            .connect_http(config.rpc_url.parse()?)
            .erased();

        let signer_provider = match wallet.ethereum_wallet() {
            Some(eth_wallet) => Some(
                ProviderBuilder::new()
                    .wallet(eth_wallet)
                    .connect_http(config.rpc_url.parse()?)
                    .erased(),
            ),
            None => None,
        };

        let arena = config.arena_address()?;
        info!("Arena reader connected: {:?} via {}", arena, config.rpc_url);

        Ok(Self {
            provider,
            signer_provider,
            agent: wallet.address(),
            arena,
            pool_manager: config.pool_manager()?,
            leaderboard: config.leaderboard()?,
        })
    }

    /// eth_call a view function and decode its return value
    async fn view<C: SolCall>(&self, to: Address, call: C) -> Result<C::Return> {
        let tx = TransactionRequest::default()
            .to(to)
            .input(call.abi_encode().into());

        let result = self
            .provider
            .call(tx)
            .await
            .map_err(|e| eyre!("{} on {:?} failed: {}", C::SIGNATURE, to, e))?;

        C::abi_decode_returns(&result)
            .map_err(|e| eyre!("Failed to decode {} result: {}", C::SIGNATURE, e))
    }

    fn settle_request(&self, id: U256) -> TransactionRequest {
        TransactionRequest::default()
            .to(self.arena)
            .input(IBattleArena::settleBattleCall { battleId: id }.abi_encode().into())
    }
}

#[async_trait]
impl ArenaChain for RpcArena {
    async fn active_battle_ids(&self) -> Result<Vec<U256>> {
        self.view(self.arena, IBattleArena::getActiveBattlesCall {}).await
    }

    async fn pending_battle_ids(&self) -> Result<Vec<U256>> {
        self.view(self.arena, IBattleArena::getPendingBattlesCall {}).await
    }

    async fn expired_battle_ids(&self) -> Result<Vec<U256>> {
        self.view(self.arena, IBattleArena::getExpiredBattlesCall {}).await
    }

    async fn battle(&self, id: U256) -> Result<Option<Battle>> {
        let raw = self
            .view(self.arena, IBattleArena::getBattleCall { battleId: id })
            .await?;
        let battle = Battle::from_raw(id, raw);
        Ok(battle.exists().then_some(battle))
    }

    async fn is_expired(&self, id: U256) -> Result<bool> {
        self.view(self.arena, IBattleArena::isBattleExpiredCall { battleId: id })
            .await
    }

    async fn pool_storage(&self, slot: B256) -> Result<U256> {
        let manager = self
            .pool_manager
            .ok_or_else(|| eyre!("POOL_MANAGER_ADDRESS is not set"))?;

        let word = self
            .provider
            .get_storage_at(manager, U256::from_be_bytes(slot.0))
            .await
            .map_err(|e| eyre!("Storage read {} on {:?} failed: {}", slot, manager, e))?;

        debug!("Slot {} = {:#x}", slot, word);
        Ok(word)
    }

    async fn elo(&self, player: Address) -> Result<Option<U256>> {
        let Some(leaderboard) = self.leaderboard else {
            return Ok(None);
        };
        let elo = self
            .view(leaderboard, ILeaderboard::getEloCall { player })
            .await?;
        Ok(Some(elo))
    }

    async fn vault_summary(&self, vault: Address) -> Result<VaultSummary> {
        let name = self.view(vault, IERC4626::nameCall {}).await?;
        let asset = self.view(vault, IERC4626::assetCall {}).await?;
        let total_assets = self.view(vault, IERC4626::totalAssetsCall {}).await?;
        let total_supply = self.view(vault, IERC4626::totalSupplyCall {}).await?;

        let agent_shares = match self.agent {
            Some(account) => Some(self.view(vault, IERC4626::balanceOfCall { account }).await?),
            None => None,
        };

        Ok(VaultSummary {
            address: vault,
            name,
            asset,
            total_assets,
            total_supply,
            agent_shares,
        })
    }

    async fn block_number(&self) -> Result<u64> {
        Ok(self.provider.get_block_number().await?)
    }

    fn agent_address(&self) -> Option<Address> {
        self.agent
    }

    async fn simulate_settle(&self, id: U256) -> Result<()> {
        let mut tx = self.settle_request(id);
        if let Some(from) = self.agent {
            tx = tx.from(from);
        }

        self.provider
            .call(tx)
            .await
            .map_err(|e| eyre!("settleBattle({}) would revert: {}", id, e))?;
        Ok(())
    }

    async fn settle(&self, id: U256) -> Result<B256> {
        let signer = self
            .signer_provider
            .as_ref()
            .ok_or_else(|| eyre!("No agent key configured - cannot send settleBattle"))?;

        let pending = signer
            .send_transaction(self.settle_request(id))
            .await
            .map_err(|e| eyre!("settleBattle({}) submission failed: {}", id, e))?;

        let tx_hash = *pending.tx_hash();
        info!("📤 settleBattle({}) sent: {}", id, tx_hash);
        Ok(tx_hash)
    }
}
