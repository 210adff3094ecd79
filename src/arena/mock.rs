//! In-memory arena used by the agent, analyzer and server tests.

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use eyre::{eyre, Result};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use super::battle::{Battle, BattleStatus, BattleType, TickRange};
use super::reader::ArenaChain;
use super::vaults::VaultSummary;

#[derive(Default)]
pub struct MockArena {
    pub battles: HashMap<U256, Battle>,
    pub active: Vec<U256>,
    pub pending: Vec<U256>,
    pub expired: Vec<U256>,
    pub storage: HashMap<B256, U256>,
    pub elo: HashMap<Address, U256>,
    pub vaults: HashMap<Address, VaultSummary>,
    /// Battle ids whose detail read fails
    pub broken: HashSet<U256>,
    /// Battle ids whose settlement reverts
    pub reverting: HashSet<U256>,
    pub fail_enumeration: bool,
    pub agent: Option<Address>,
    pub settled: Mutex<Vec<U256>>,
}

impl MockArena {
    pub fn new() -> Self {
        Self {
            agent: Some(Address::repeat_byte(0xA6)),
            ..Self::default()
        }
    }

    pub fn with_battle(mut self, battle: Battle) -> Self {
        match battle.status {
            BattleStatus::Pending => self.pending.push(battle.id),
            BattleStatus::Active => self.active.push(battle.id),
            _ => {}
        }
        self.battles.insert(battle.id, battle);
        self
    }

    pub fn settled_ids(&self) -> Vec<U256> {
        self.settled.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

/// A battle fixture; tweak the fields per test
pub fn battle(id: u64, status: BattleStatus) -> Battle {
    Battle {
        id: U256::from(id),
        creator: Address::repeat_byte(0x11),
        opponent: if status == BattleStatus::Pending {
            Address::ZERO
        } else {
            Address::repeat_byte(0x22)
        },
        pool_id: B256::repeat_byte(0x42),
        creator_range: TickRange { lower: -120, upper: 120 },
        opponent_range: TickRange { lower: 60, upper: 600 },
        battle_type: BattleType::Range,
        status,
        start_time: if status == BattleStatus::Pending { 0 } else { 1_000 },
        duration: 3_600,
        last_update_time: if status == BattleStatus::Pending { 0 } else { 1_000 },
        creator_in_range_time: 0,
        opponent_in_range_time: 0,
        creator_score: U256::ZERO,
        opponent_score: U256::ZERO,
        winner: Address::ZERO,
        total_fees: U256::from(1_000_000u64),
        resolver_bps: U256::from(100u64),
        dex_type: 0,
        creator_fees: U256::ZERO,
        opponent_fees: U256::ZERO,
        creator_lp_value: U256::ZERO,
        opponent_lp_value: U256::ZERO,
    }
}

#[async_trait]
impl ArenaChain for MockArena {
    async fn active_battle_ids(&self) -> Result<Vec<U256>> {
        if self.fail_enumeration {
            return Err(eyre!("rpc unavailable"));
        }
        Ok(self.active.clone())
    }

    async fn pending_battle_ids(&self) -> Result<Vec<U256>> {
        if self.fail_enumeration {
            return Err(eyre!("rpc unavailable"));
        }
        Ok(self.pending.clone())
    }

    async fn expired_battle_ids(&self) -> Result<Vec<U256>> {
        if self.fail_enumeration {
            return Err(eyre!("rpc unavailable"));
        }
        Ok(self.expired.clone())
    }

    async fn battle(&self, id: U256) -> Result<Option<Battle>> {
        if self.broken.contains(&id) {
            return Err(eyre!("getBattle({}) reverted", id));
        }
        Ok(self.battles.get(&id).cloned())
    }

    async fn is_expired(&self, id: U256) -> Result<bool> {
        Ok(self.expired.contains(&id))
    }

    async fn pool_storage(&self, slot: B256) -> Result<U256> {
        self.storage
            .get(&slot)
            .copied()
            .ok_or_else(|| eyre!("no storage at {}", slot))
    }

    async fn elo(&self, player: Address) -> Result<Option<U256>> {
        Ok(self.elo.get(&player).copied())
    }

    async fn vault_summary(&self, vault: Address) -> Result<VaultSummary> {
        self.vaults
            .get(&vault)
            .cloned()
            .ok_or_else(|| eyre!("vault {:?} unreachable", vault))
    }

    async fn block_number(&self) -> Result<u64> {
        Ok(19_000_000)
    }

    fn agent_address(&self) -> Option<Address> {
        self.agent
    }

    async fn simulate_settle(&self, id: U256) -> Result<()> {
        if self.reverting.contains(&id) {
            return Err(eyre!("settleBattle({}) would revert: BattleNotExpired", id));
        }
        Ok(())
    }

    async fn settle(&self, id: U256) -> Result<B256> {
        if self.reverting.contains(&id) {
            return Err(eyre!("settleBattle({}) reverted", id));
        }
        if let Ok(mut settled) = self.settled.lock() {
            settled.push(id);
        }
        Ok(B256::from(id.to_be_bytes::<32>()))
    }
}
