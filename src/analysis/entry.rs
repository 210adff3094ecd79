//! Entry-opportunity heuristic for pending battles.

use crate::arena::BattleStatus;

const BASE_SCORE: i32 = 50;
const ONE_HOUR: u64 = 3_600;
const SIX_HOURS: u64 = 6 * ONE_HOUR;
const ONE_DAY: u64 = 24 * ONE_HOUR;

pub const ENTRY_VERDICT: &str = "Worth considering for entry";

/// Score 0..=100; only pending battles (open for an opponent) score above 0.
/// Short battles resolve sooner and are favoured.
pub fn entry_score(status: BattleStatus, time_remaining: u64) -> u8 {
    if status != BattleStatus::Pending {
        return 0;
    }

    let mut score = BASE_SCORE;
    if time_remaining <= ONE_HOUR {
        score += 20;
    } else if time_remaining <= SIX_HOURS {
        score += 10;
    } else if time_remaining >= ONE_DAY {
        score -= 10;
    }

    score.clamp(0, 100) as u8
}

/// Verdict line for a score, given the configured threshold
pub fn entry_verdict(score: u8, threshold: u8) -> Option<&'static str> {
    (score > threshold).then_some(ENTRY_VERDICT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_pending_scores_zero() {
        for status in [
            BattleStatus::Active,
            BattleStatus::Resolved,
            BattleStatus::Cancelled,
            BattleStatus::Unknown(7),
        ] {
            assert_eq!(entry_score(status, 60), 0);
        }
    }

    #[test]
    fn test_pending_buckets() {
        assert_eq!(entry_score(BattleStatus::Pending, 0), 70);
        assert_eq!(entry_score(BattleStatus::Pending, 1_800), 70);
        assert_eq!(entry_score(BattleStatus::Pending, 3_600), 70);
        assert_eq!(entry_score(BattleStatus::Pending, 3_601), 60);
        assert_eq!(entry_score(BattleStatus::Pending, 21_600), 60);
        assert_eq!(entry_score(BattleStatus::Pending, 43_200), 50);
        assert_eq!(entry_score(BattleStatus::Pending, 86_400), 40);
        assert_eq!(entry_score(BattleStatus::Pending, 604_800), 40);
    }

    #[test]
    fn test_verdict_threshold_is_strict() {
        assert_eq!(entry_verdict(70, 60), Some(ENTRY_VERDICT));
        assert_eq!(entry_verdict(60, 60), None);
        assert_eq!(entry_verdict(0, 60), None);
    }
}
