//! The Watcher (Data Ingest)
//!
//! Responsible for:
//! - Enumerating and decoding battles from the BattleArena
//! - Reading packed pool state straight out of PoolManager storage
//! - Summarizing the ERC-4626 vaults the agent tracks

mod battle;
mod contracts;
mod pool_state;
mod reader;
mod vaults;

#[cfg(test)]
pub mod mock;

pub use battle::{Battle, BattleNotFound, BattleStatus, BattleType};
pub use pool_state::{pool_state_slot, PoolState};
pub use reader::{ArenaChain, RpcArena};
pub use vaults::VaultSummary;
