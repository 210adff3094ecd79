//! Off-chain mirror of the arena's scoring contract.
//!
//! Integer math on U256 at 1e18 precision, so a projected leader here matches
//! what `settleBattle` will decide on-chain.

use alloy_primitives::U256;

// ============================================
// CONSTANTS
// ============================================

/// Fixed-point unit for scores
pub const SCORE_UNIT: u64 = 1_000_000_000_000_000_000;

pub const MAX_BPS: u64 = 10_000;

/// Ranges narrower than this many ticks earn a bonus
pub const TIGHT_RANGE_TICKS: u64 = 100;

/// Bonus for a zero-width range: 20% of SCORE_UNIT
pub const TIGHT_RANGE_MAX_BONUS: u64 = 200_000_000_000_000_000;

/// Per-DEX score weight in bps, indexed by `DexKind as u8`
const DEX_WEIGHTS_BPS: [u64; 2] = [10_000, 10_000];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DexKind {
    UniswapV4 = 0,
    CamelotV3 = 1,
}

impl DexKind {
    pub fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(DexKind::UniswapV4),
            1 => Some(DexKind::CamelotV3),
            _ => None,
        }
    }
}

impl std::fmt::Display for DexKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DexKind::UniswapV4 => write!(f, "Uniswap V4"),
            DexKind::CamelotV3 => write!(f, "Camelot V3"),
        }
    }
}

/// Which side a score comparison favours
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Creator,
    Opponent,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Creator => write!(f, "creator"),
            Side::Opponent => write!(f, "opponent"),
        }
    }
}

// ============================================
// SCORES
// ============================================

/// Share of time in range scaled to 1e18, plus up to 20% for tight ranges
pub fn range_score(in_range: U256, total: U256, tick_distance: U256) -> U256 {
    if total.is_zero() {
        return U256::ZERO;
    }

    let unit = U256::from(SCORE_UNIT);
    let base = in_range * unit / total;

    let threshold = U256::from(TIGHT_RANGE_TICKS);
    let bonus = if tick_distance < threshold {
        U256::from(TIGHT_RANGE_MAX_BONUS) * (threshold - tick_distance) / threshold
    } else {
        U256::ZERO
    };

    base + base * bonus / unit
}

/// Fee yield per unit of liquidity per second, scaled to 1e18
pub fn fee_score(fees: U256, lp_value: U256, duration: U256) -> U256 {
    if lp_value.is_zero() || duration.is_zero() {
        return U256::ZERO;
    }
    fees * U256::from(SCORE_UNIT) / (lp_value * duration)
}

/// Ties go to the creator
pub fn winner(creator_score: U256, opponent_score: U256) -> Side {
    if creator_score >= opponent_score {
        Side::Creator
    } else {
        Side::Opponent
    }
}

/// Split collected fees into (winner amount, resolver amount)
pub fn rewards(total_fees: U256, resolver_bps: U256) -> (U256, U256) {
    let max = U256::from(MAX_BPS);
    if resolver_bps >= max {
        return (U256::ZERO, total_fees);
    }
    let resolver = total_fees * resolver_bps / max;
    (total_fees - resolver, resolver)
}

/// Apply the per-DEX weight; unknown DEX ids are left unchanged
pub fn normalize_cross_dex(score: U256, dex: u8) -> U256 {
    let weight = DEX_WEIGHTS_BPS
        .get(dex as usize)
        .copied()
        .unwrap_or(MAX_BPS);
    score * U256::from(weight) / U256::from(MAX_BPS)
}
