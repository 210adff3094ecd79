//! The Brain (Battle Analysis)
//!
//! Responsible for:
//! - Win-probability estimates from in-range time
//! - Entry scoring for pending battles
//! - Off-chain mirrors of the arena's scoring and ELO rules
//! - Combining all of the above into a per-battle recommendation

mod analyzer;
mod elo;
mod entry;
mod probability;
pub mod scoring;

pub use analyzer::{score_battle_for_entry, BattleAnalysis, PoolAnalyzer};
pub use scoring::Side;
