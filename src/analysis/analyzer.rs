//! PoolAnalyzer - per-battle analysis.
//!
//! Reads the battle and its pool's packed Slot0 word, then derives the
//! expiry, in-range flags, projected leader, win probability, entry score and
//! a one-line recommendation. Read failures for the pool or the leaderboard
//! are logged and leave the corresponding fields empty.

use alloy_primitives::{Address, B256, U256};
use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use super::elo;
use super::entry::{entry_score, entry_verdict};
use super::probability::{self, WinProbability};
use super::scoring::{self, Side};
use crate::arena::{
    pool_state_slot, ArenaChain, Battle, BattleNotFound, BattleStatus, BattleType, PoolState,
};

/// Leaderboard ratings and what each side would gain by winning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EloStakes {
    #[serde(with = "crate::decimal")]
    pub creator: U256,
    #[serde(with = "crate::decimal")]
    pub opponent: U256,
    #[serde(with = "crate::decimal")]
    pub creator_gain: U256,
    #[serde(with = "crate::decimal")]
    pub opponent_gain: U256,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleAnalysis {
    pub battle: Battle,
    pub is_expired: bool,
    pub time_remaining: u64,
    /// Seconds elapsed when the in-range counters were last accumulated
    pub elapsed: u64,
    pub pool: Option<PoolState>,
    pub creator_in_range: Option<bool>,
    pub opponent_in_range: Option<bool>,
    pub projected_leader: Option<Side>,
    #[serde(with = "crate::decimal")]
    pub resolver_reward: U256,
    pub win_probability: WinProbability,
    pub entry_score: u8,
    pub elo: Option<EloStakes>,
    pub recommendation: String,
}

impl BattleAnalysis {
    pub fn worth_entering(&self, threshold: u8) -> bool {
        entry_verdict(self.entry_score, threshold).is_some()
    }
}

/// Entry attractiveness of an analyzed battle (0..=100)
pub fn score_battle_for_entry(analysis: &BattleAnalysis) -> u8 {
    entry_score(analysis.battle.status, analysis.time_remaining)
}

/// Win probability from the battle's accumulated in-range counters
pub fn estimate_win_probability(battle: &Battle) -> WinProbability {
    probability::estimate(
        battle.elapsed_at_last_update(),
        battle.duration,
        battle.creator_in_range_time,
        battle.opponent_in_range_time,
    )
}

/// Leader by the arena's own scoring rules, if the battle has data to score
pub fn project_leader(battle: &Battle) -> Option<Side> {
    if battle.status == BattleStatus::Pending || !battle.has_opponent() {
        return None;
    }

    match battle.battle_type {
        BattleType::Range => {
            let elapsed = battle.elapsed_at_last_update();
            if elapsed == 0 {
                return None;
            }
            let total = U256::from(elapsed);
            let creator = scoring::range_score(
                U256::from(battle.creator_in_range_time),
                total,
                U256::from(battle.creator_range.width()),
            );
            let opponent = scoring::range_score(
                U256::from(battle.opponent_in_range_time),
                total,
                U256::from(battle.opponent_range.width()),
            );
            Some(scoring::winner(
                scoring::normalize_cross_dex(creator, battle.dex_type),
                scoring::normalize_cross_dex(opponent, battle.dex_type),
            ))
        }
        BattleType::Fee => {
            // Scores written by the arena win over the local projection
            if !(battle.creator_score.is_zero() && battle.opponent_score.is_zero()) {
                return Some(scoring::winner(battle.creator_score, battle.opponent_score));
            }

            let elapsed = U256::from(battle.elapsed_at_last_update());
            let creator =
                scoring::fee_score(battle.creator_fees, battle.creator_lp_value, elapsed);
            let opponent =
                scoring::fee_score(battle.opponent_fees, battle.opponent_lp_value, elapsed);
            if creator.is_zero() && opponent.is_zero() {
                return None;
            }
            Some(scoring::winner(
                scoring::normalize_cross_dex(creator, battle.dex_type),
                scoring::normalize_cross_dex(opponent, battle.dex_type),
            ))
        }
    }
}

pub fn unix_now() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

pub struct PoolAnalyzer {
    chain: Arc<dyn ArenaChain>,
    entry_threshold: u8,
}

impl PoolAnalyzer {
    pub fn new(chain: Arc<dyn ArenaChain>, entry_threshold: u8) -> Self {
        Self {
            chain,
            entry_threshold,
        }
    }

    pub fn entry_threshold(&self) -> u8 {
        self.entry_threshold
    }

    /// Slot0 of a pool; None when unreadable or never initialized
    pub async fn read_pool_state(&self, pool_id: B256) -> Option<PoolState> {
        let slot = pool_state_slot(pool_id);
        match self.chain.pool_storage(slot).await {
            Ok(word) => {
                let state = PoolState::decode(word);
                if state.is_initialized() {
                    debug!("Pool {} at tick {}", pool_id, state.tick);
                    Some(state)
                } else {
                    debug!("Pool {} not initialized", pool_id);
                    None
                }
            }
            Err(e) => {
                warn!("⚠️  Pool state read failed for {}: {}", pool_id, e);
                None
            }
        }
    }

    /// A zero rating is a player the leaderboard has not seen yet
    async fn read_elo(&self, player: Address) -> Option<U256> {
        match self.chain.elo(player).await {
            Ok(Some(elo)) if elo.is_zero() => Some(U256::from(elo::DEFAULT_ELO)),
            Ok(elo) => elo,
            Err(e) => {
                warn!("⚠️  ELO read failed for {:?}: {}", player, e);
                None
            }
        }
    }

    async fn elo_stakes(&self, battle: &Battle) -> Option<EloStakes> {
        if !battle.has_opponent() {
            return None;
        }
        let creator = self.read_elo(battle.creator).await?;
        let opponent = self.read_elo(battle.opponent).await?;
        let (creator_gain, opponent_gain) = elo::stakes(creator, opponent);
        Some(EloStakes {
            creator,
            opponent,
            creator_gain,
            opponent_gain,
        })
    }

    /// Fetch and analyze one battle. An id the arena never issued fails
    /// with a `BattleNotFound` error.
    pub async fn analyze(&self, id: U256) -> Result<BattleAnalysis> {
        let battle = self
            .chain
            .battle(id)
            .await
            .wrap_err_with(|| format!("Failed to read battle {}", id))?
            .ok_or(BattleNotFound(id))?;
        Ok(self.analyze_battle(battle).await)
    }

    /// Analyze an already-fetched battle against the current pool state
    pub async fn analyze_battle(&self, battle: Battle) -> BattleAnalysis {
        let pool = self.read_pool_state(battle.pool_id).await;
        let elo = self.elo_stakes(&battle).await;
        self.analyze_with_clock(battle, pool, elo, unix_now())
    }

    /// Pure part of the analysis
    pub fn analyze_with_clock(
        &self,
        battle: Battle,
        pool: Option<PoolState>,
        elo: Option<EloStakes>,
        now: u64,
    ) -> BattleAnalysis {
        let is_expired = battle.is_expired(now);
        let time_remaining = battle.time_remaining(now);
        let elapsed = battle.elapsed_at_last_update();

        let creator_in_range = pool.map(|p| battle.creator_range.contains(p.tick));
        let opponent_in_range = pool
            .filter(|_| battle.has_opponent())
            .map(|p| battle.opponent_range.contains(p.tick));

        let (_, resolver_reward) = scoring::rewards(battle.total_fees, battle.resolver_bps);
        let win_probability = estimate_win_probability(&battle);
        let projected_leader = project_leader(&battle);
        let score = entry_score(battle.status, time_remaining);

        let recommendation = recommend(
            &battle,
            is_expired,
            time_remaining,
            score,
            self.entry_threshold,
            projected_leader,
            &win_probability,
            resolver_reward,
        );

        BattleAnalysis {
            battle,
            is_expired,
            time_remaining,
            elapsed,
            pool,
            creator_in_range,
            opponent_in_range,
            projected_leader,
            resolver_reward,
            win_probability,
            entry_score: score,
            elo,
            recommendation,
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn recommend(
    battle: &Battle,
    is_expired: bool,
    time_remaining: u64,
    score: u8,
    threshold: u8,
    leader: Option<Side>,
    probability: &WinProbability,
    resolver_reward: U256,
) -> String {
    match battle.status {
        BattleStatus::Pending => match entry_verdict(score, threshold) {
            Some(verdict) => verdict.to_string(),
            None => format!("Open for entry (score {}/100)", score),
        },
        BattleStatus::Active if is_expired => {
            format!("Ready to settle - resolver reward {}", resolver_reward)
        }
        BattleStatus::Active => {
            let chance = |side: Side| match side {
                Side::Creator => probability.creator * 100.0,
                Side::Opponent => probability.opponent * 100.0,
            };
            let leading = match (leader, probability.favourite()) {
                (Some(side), _) => format!("{} leading ({:.0}% win chance)", side, chance(side)),
                (None, Some(side)) => format!("{} favoured ({:.0}% win chance)", side, chance(side)),
                (None, None) => "no clear leader".to_string(),
            };
            format!("Monitor - {}s remaining, {}", time_remaining, leading)
        }
        BattleStatus::Resolved => format!("Resolved - winner {:?}", battle.winner),
        BattleStatus::Cancelled => "Cancelled - nothing to do".to_string(),
        BattleStatus::Unknown(raw) => format!("Unknown status {} - skipping", raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::mock::{battle, MockArena};

    fn analyzer(arena: MockArena) -> PoolAnalyzer {
        PoolAnalyzer::new(Arc::new(arena), 60)
    }

    fn pool_at(tick: i32) -> PoolState {
        PoolState {
            sqrt_price_x96: U256::from(1u64) << 96,
            tick,
            protocol_fee: 0,
            lp_fee: 3000,
        }
    }

    #[test]
    fn test_pending_short_battle_is_worth_entering() {
        let mut b = battle(1, BattleStatus::Pending);
        b.duration = 1_800;

        let a = analyzer(MockArena::new()).analyze_with_clock(b, None, None, 50_000);
        assert_eq!(a.time_remaining, 1_800);
        assert_eq!(score_battle_for_entry(&a), 70);
        assert_eq!(a.recommendation, "Worth considering for entry");
        assert!(a.worth_entering(60));
    }

    #[test]
    fn test_pending_long_battle_is_not() {
        let mut b = battle(2, BattleStatus::Pending);
        b.duration = 2 * 86_400;

        let a = analyzer(MockArena::new()).analyze_with_clock(b, None, None, 50_000);
        assert_eq!(score_battle_for_entry(&a), 40);
        assert!(a.recommendation.starts_with("Open for entry"));
    }

    #[test]
    fn test_expired_battle_recommends_settlement() {
        let b = battle(3, BattleStatus::Active);
        let a = analyzer(MockArena::new()).analyze_with_clock(b, None, None, 4_600);
        assert!(a.is_expired);
        assert_eq!(a.time_remaining, 0);
        assert_eq!(a.entry_score, 0);
        // 1% of 1_000_000
        assert_eq!(a.resolver_reward, U256::from(10_000u64));
        assert_eq!(a.recommendation, "Ready to settle - resolver reward 10000");
    }

    #[test]
    fn test_in_range_flags_follow_pool_tick() {
        let b = battle(4, BattleStatus::Active);
        let an = analyzer(MockArena::new());

        let a = an.analyze_with_clock(b.clone(), Some(pool_at(100)), None, 2_000);
        assert_eq!(a.creator_in_range, Some(true));
        assert_eq!(a.opponent_in_range, Some(true));

        let a = an.analyze_with_clock(b.clone(), Some(pool_at(-500)), None, 2_000);
        assert_eq!(a.creator_in_range, Some(false));
        assert_eq!(a.opponent_in_range, Some(false));

        let a = an.analyze_with_clock(b, None, None, 2_000);
        assert_eq!(a.creator_in_range, None);
    }

    #[test]
    fn test_range_leader_uses_in_range_time() {
        let mut b = battle(5, BattleStatus::Active);
        b.last_update_time = b.start_time + 1_800;
        b.creator_in_range_time = 600;
        b.opponent_in_range_time = 1_500;

        assert_eq!(project_leader(&b), Some(Side::Opponent));

        let a = analyzer(MockArena::new()).analyze_with_clock(b, None, None, 2_900);
        assert!(a.win_probability.opponent > a.win_probability.creator);
        assert!(a.recommendation.contains("opponent leading"));
    }

    #[test]
    fn test_fee_leader_uses_onchain_scores() {
        let mut b = battle(6, BattleStatus::Active);
        b.battle_type = BattleType::Fee;
        assert_eq!(project_leader(&b), None);

        b.creator_score = U256::from(7u64);
        b.opponent_score = U256::from(7u64);
        assert_eq!(project_leader(&b), Some(Side::Creator));
    }

    #[test]
    fn test_fee_leader_projected_from_yield() {
        let mut b = battle(9, BattleStatus::Active);
        b.battle_type = BattleType::Fee;
        b.dex_type = 1;
        b.last_update_time = b.start_time + 3_600;

        // Same fees, opponent on half the liquidity: higher yield
        b.creator_fees = U256::from(100u64);
        b.opponent_fees = U256::from(100u64);
        b.creator_lp_value = U256::from(2_000u64);
        b.opponent_lp_value = U256::from(1_000u64);
        assert_eq!(project_leader(&b), Some(Side::Opponent));

        // Nothing accumulated yet
        b.last_update_time = b.start_time;
        assert_eq!(project_leader(&b), None);
    }

    #[test]
    fn test_recommendation_falls_back_to_favourite() {
        let mut b = battle(11, BattleStatus::Active);
        b.battle_type = BattleType::Fee;
        b.last_update_time = b.start_time + 1_800;
        b.creator_in_range_time = 1_500;
        b.opponent_in_range_time = 300;
        assert_eq!(project_leader(&b), None);

        let a = analyzer(MockArena::new()).analyze_with_clock(b, None, None, 2_900);
        assert!(a.recommendation.contains("creator favoured"));
    }

    #[tokio::test]
    async fn test_analyze_reads_pool_and_elo() {
        let b = battle(7, BattleStatus::Active);
        let mut arena = MockArena::new().with_battle(b.clone());
        arena
            .storage
            .insert(pool_state_slot(b.pool_id), pool_at(-60).encode());
        arena.elo.insert(b.creator, U256::from(1_000u64));
        arena.elo.insert(b.opponent, U256::from(1_000u64));

        let a = analyzer(arena).analyze(U256::from(7u64)).await.unwrap();
        assert_eq!(a.pool.map(|p| p.tick), Some(-60));
        assert_eq!(a.creator_in_range, Some(true));
        assert_eq!(a.opponent_in_range, Some(false));

        let stakes = a.elo.unwrap();
        assert_eq!(stakes.creator_gain, U256::from(16u64));
    }

    #[tokio::test]
    async fn test_unrated_player_gets_default_elo() {
        let b = battle(10, BattleStatus::Active);
        let mut arena = MockArena::new().with_battle(b.clone());
        arena.elo.insert(b.creator, U256::ZERO);
        arena.elo.insert(b.opponent, U256::from(1_000u64));

        let a = analyzer(arena).analyze(U256::from(10u64)).await.unwrap();
        let stakes = a.elo.unwrap();
        assert_eq!(stakes.creator, U256::from(elo::DEFAULT_ELO));
        assert_eq!(stakes.creator_gain, U256::from(16u64));
        assert_eq!(stakes.opponent_gain, U256::from(16u64));
    }

    #[tokio::test]
    async fn test_unreadable_pool_is_none() {
        let b = battle(8, BattleStatus::Active);
        let arena = MockArena::new().with_battle(b);

        let a = analyzer(arena).analyze(U256::from(8u64)).await.unwrap();
        assert!(a.pool.is_none());
        assert!(a.elo.is_none());
    }

    #[tokio::test]
    async fn test_missing_battle_errors() {
        let err = analyzer(MockArena::new())
            .analyze(U256::from(99u64))
            .await
            .unwrap_err();
        assert_eq!(err.downcast_ref::<BattleNotFound>(), Some(&BattleNotFound(U256::from(99u64))));

        let mut arena = MockArena::new().with_battle(battle(5, BattleStatus::Active));
        arena.broken.insert(U256::from(5u64));
        let err = analyzer(arena).analyze(U256::from(5u64)).await.unwrap_err();
        assert!(err.downcast_ref::<BattleNotFound>().is_none());
        assert!(format!("{:#}", err).contains("reverted"));
    }
}
