//! Win-probability estimate from in-range time.
//!
//! The raw estimate (each side's share of in-range time) is noisy early in a
//! battle, so it is blended with a coin flip. The blend weight follows a
//! piecewise-linear confidence curve over battle progress:
//!
//! ```text
//! confidence
//!   1.0 |                         /
//!   0.5 |       _________________/
//!       |     /
//!   0.0 |___/
//!       0   0.25            0.75   1.0   progress
//! ```

use serde::{Deserialize, Serialize};

use super::scoring::Side;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinProbability {
    pub creator: f64,
    pub opponent: f64,
    /// Weight given to the observed data (0 = coin flip, 1 = raw share)
    pub confidence: f64,
    pub rationale: String,
}

impl WinProbability {
    fn even(rationale: &str) -> Self {
        Self {
            creator: 0.5,
            opponent: 0.5,
            confidence: 0.0,
            rationale: rationale.to_string(),
        }
    }

    pub fn favourite(&self) -> Option<Side> {
        if self.creator > self.opponent {
            Some(Side::Creator)
        } else if self.opponent > self.creator {
            Some(Side::Opponent)
        } else {
            None
        }
    }
}

/// Blend weight for a given fraction of the battle elapsed
pub fn confidence(progress: f64) -> f64 {
    let p = if progress.is_nan() { 0.0 } else { progress.clamp(0.0, 1.0) };

    if p <= 0.25 {
        p * 2.0
    } else if p <= 0.75 {
        0.5
    } else {
        0.5 + (p - 0.75) * 2.0
    }
}

/// Estimate each side's chance of winning a range battle
pub fn estimate(
    elapsed: u64,
    duration: u64,
    creator_in_range: u64,
    opponent_in_range: u64,
) -> WinProbability {
    if elapsed == 0 {
        return WinProbability::even("No time elapsed yet - insufficient data");
    }
    if creator_in_range == 0 && opponent_in_range == 0 {
        return WinProbability::even("Neither position has been in range yet");
    }

    let creator_frac = (creator_in_range as f64 / elapsed as f64).min(1.0);
    let opponent_frac = (opponent_in_range as f64 / elapsed as f64).min(1.0);
    let raw_creator = creator_frac / (creator_frac + opponent_frac);

    let progress = if duration == 0 {
        1.0
    } else {
        elapsed as f64 / duration as f64
    };
    let weight = confidence(progress);

    let creator = (weight * raw_creator + (1.0 - weight) * 0.5).clamp(0.0, 1.0);
    let opponent = 1.0 - creator;

    let rationale = format!(
        "Creator in range {:.1}% vs opponent {:.1}% of {}s elapsed ({:.0}% of battle); \
         confidence {:.2}",
        creator_frac * 100.0,
        opponent_frac * 100.0,
        elapsed,
        progress.min(1.0) * 100.0,
        weight,
    );

    WinProbability {
        creator,
        opponent,
        confidence: weight,
        rationale,
    }
}
