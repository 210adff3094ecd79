//! Leaderboard rating projection.
//!
//! Integer approximation of ELO used by the leaderboard contract: the
//! winner's expected score moves linearly with the rating gap (clamped to
//! [0, 1]) instead of following the logistic curve.

use alloy_primitives::U256;

pub const DEFAULT_ELO: u64 = 1_000;
pub const K_FACTOR: u64 = 32;
pub const ELO_SCALE: u64 = 1_000;
pub const ELO_SPREAD: u64 = 400;

/// Ratings never drop below this
pub const ELO_FLOOR: u64 = 100;

/// Winner's expected score on the ELO_SCALE
fn expected_winner(winner: U256, loser: U256) -> U256 {
    let scale = U256::from(ELO_SCALE);
    let half = scale / U256::from(2u64);
    let spread = U256::from(ELO_SPREAD * 4);

    if winner >= loser {
        let bonus = (winner - loser) * scale / spread;
        (half + bonus).min(scale)
    } else {
        let penalty = (loser - winner) * scale / spread;
        half.saturating_sub(penalty)
    }
}

/// Ratings after `winner` beats `loser`: (new winner, new loser)
pub fn project_elo(winner: U256, loser: U256) -> (U256, U256) {
    let k = U256::from(K_FACTOR);
    let scale = U256::from(ELO_SCALE);
    let expected = expected_winner(winner, loser);

    // Loser's expected score is the complement, so the raw swing is symmetric
    let swing = k * (scale - expected) / scale;
    let gain = swing.max(U256::from(1u64));
    let loss = swing;

    let floor = U256::from(ELO_FLOOR);
    let new_loser = if loser > loss + floor {
        loser - loss
    } else {
        floor
    };

    (winner + gain, new_loser)
}

/// Rating change for both players if each side wins: (creator gain, opponent gain)
pub fn stakes(creator: U256, opponent: U256) -> (U256, U256) {
    let (creator_wins, _) = project_elo(creator, opponent);
    let (opponent_wins, _) = project_elo(opponent, creator);
    (creator_wins - creator, opponent_wins - opponent)
}
