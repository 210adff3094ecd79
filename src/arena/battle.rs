//! On-chain battle record, decoded into native types.

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

use super::contracts::IBattleArena;

/// Lifecycle status as stored by the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleStatus {
    /// Created, waiting for an opponent
    Pending,
    /// Both sides joined, clock running
    Active,
    /// Settled on-chain
    Resolved,
    Cancelled,
    Unknown(u8),
}

impl From<u8> for BattleStatus {
    fn from(raw: u8) -> Self {
        match raw {
            0 => BattleStatus::Pending,
            1 => BattleStatus::Active,
            2 => BattleStatus::Resolved,
            3 => BattleStatus::Cancelled,
            other => BattleStatus::Unknown(other),
        }
    }
}

impl std::fmt::Display for BattleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BattleStatus::Pending => write!(f, "pending"),
            BattleStatus::Active => write!(f, "active"),
            BattleStatus::Resolved => write!(f, "resolved"),
            BattleStatus::Cancelled => write!(f, "cancelled"),
            BattleStatus::Unknown(raw) => write!(f, "unknown({})", raw),
        }
    }
}

/// What the battle is scored on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleType {
    /// Time spent in range
    Range,
    /// Fee yield
    Fee,
}

impl From<u8> for BattleType {
    fn from(raw: u8) -> Self {
        if raw == 1 {
            BattleType::Fee
        } else {
            BattleType::Range
        }
    }
}

impl std::fmt::Display for BattleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BattleType::Range => write!(f, "range"),
            BattleType::Fee => write!(f, "fee"),
        }
    }
}

/// Inclusive tick range of an LP position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickRange {
    pub lower: i32,
    pub upper: i32,
}

impl TickRange {
    pub fn contains(&self, tick: i32) -> bool {
        tick >= self.lower && tick <= self.upper
    }

    pub fn width(&self) -> u64 {
        (self.upper as i64 - self.lower as i64).unsigned_abs()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Battle {
    #[serde(with = "crate::decimal")]
    pub id: U256,
    pub creator: Address,
    pub opponent: Address,
    pub pool_id: B256,
    pub creator_range: TickRange,
    pub opponent_range: TickRange,
    pub battle_type: BattleType,
    pub status: BattleStatus,
    pub start_time: u64,
    pub duration: u64,
    pub last_update_time: u64,
    pub creator_in_range_time: u64,
    pub opponent_in_range_time: u64,
    #[serde(with = "crate::decimal")]
    pub creator_score: U256,
    #[serde(with = "crate::decimal")]
    pub opponent_score: U256,
    pub winner: Address,
    #[serde(with = "crate::decimal")]
    pub total_fees: U256,
    #[serde(with = "crate::decimal")]
    pub resolver_bps: U256,
    /// 0 = Uniswap V4, 1 = Camelot V3
    pub dex_type: u8,
    /// Fee-battle inputs, USD-denominated by the arena
    #[serde(with = "crate::decimal")]
    pub creator_fees: U256,
    #[serde(with = "crate::decimal")]
    pub opponent_fees: U256,
    #[serde(with = "crate::decimal")]
    pub creator_lp_value: U256,
    #[serde(with = "crate::decimal")]
    pub opponent_lp_value: U256,
}

/// Timestamps and durations never get near 2^64; saturate instead of failing
fn secs(value: U256) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

impl Battle {
    pub fn from_raw(id: U256, raw: IBattleArena::Battle) -> Self {
        Self {
            id,
            creator: raw.creator,
            opponent: raw.opponent,
            pool_id: raw.poolId,
            creator_range: TickRange {
                lower: raw.creatorTickLower.as_i32(),
                upper: raw.creatorTickUpper.as_i32(),
            },
            opponent_range: TickRange {
                lower: raw.opponentTickLower.as_i32(),
                upper: raw.opponentTickUpper.as_i32(),
            },
            battle_type: BattleType::from(raw.battleType),
            status: BattleStatus::from(raw.status),
            start_time: secs(raw.startTime),
            duration: secs(raw.duration),
            last_update_time: secs(raw.lastUpdateTime),
            creator_in_range_time: secs(raw.creatorInRangeTime),
            opponent_in_range_time: secs(raw.opponentInRangeTime),
            creator_score: raw.creatorScore,
            opponent_score: raw.opponentScore,
            winner: raw.winner,
            total_fees: raw.totalFees,
            resolver_bps: raw.resolverBps,
            dex_type: raw.dexType,
            creator_fees: raw.creatorFees,
            opponent_fees: raw.opponentFees,
            creator_lp_value: raw.creatorLpValue,
            opponent_lp_value: raw.opponentLpValue,
        }
    }

    /// End of the battle; a pending battle has not started its clock yet
    pub fn end_time(&self) -> Option<u64> {
        match self.status {
            BattleStatus::Pending => None,
            _ => Some(self.start_time.saturating_add(self.duration)),
        }
    }

    /// Expiry against live wall-clock time
    pub fn is_expired(&self, now: u64) -> bool {
        self.status == BattleStatus::Active && self.end_time().is_some_and(|end| now >= end)
    }

    /// Seconds left on the clock. Pending battles report their full duration.
    pub fn time_remaining(&self, now: u64) -> u64 {
        match self.end_time() {
            None => self.duration,
            Some(end) => end.saturating_sub(now),
        }
    }

    /// Elapsed time as of the last on-chain accumulation of the in-range counters
    pub fn elapsed_at_last_update(&self) -> u64 {
        if self.status == BattleStatus::Pending {
            return 0;
        }
        self.last_update_time.saturating_sub(self.start_time)
    }

    pub fn has_opponent(&self) -> bool {
        self.opponent != Address::ZERO
    }

    /// The arena returns a zeroed record for ids it never issued
    pub fn exists(&self) -> bool {
        self.creator != Address::ZERO
    }
}

/// No battle with this id exists on the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BattleNotFound(pub U256);

impl std::fmt::Display for BattleNotFound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Battle {} does not exist", self.0)
    }
}

impl std::error::Error for BattleNotFound {}
