//! The Agent (Polling Loop)
//!
//! Responsible for:
//! - Monitor: enumerate active, pending and expired battles
//! - Decide: analyze each battle and pick an action
//! - Act: settle expired battles through the settlement engine
//! - Route: quote the configured cross-chain route, if any
//!
//! Everything runs sequentially; a failed read or write is logged to the
//! context and the cycle moves on to the next battle.

pub mod context;

use context::{AgentContext, CycleSummary, Decision, DecisionAction, TxEvidence};

use alloy_primitives::{Address, U256};
use chrono::{DateTime, Utc};
use eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::analysis::{score_battle_for_entry, BattleAnalysis, PoolAnalyzer};
use crate::arena::{ArenaChain, BattleStatus, RpcArena, VaultSummary};
use crate::bridge::{LifiClient, LifiQuote, QuoteRequest};
use crate::config::{Config, ExecutionMode};
use crate::executor::{AgentWallet, SettlementEngine, SettlementResult};

/// Agent health as served on `/status`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentStatus {
    pub version: String,
    pub mode: ExecutionMode,
    pub chain_id: u64,
    pub arena: Option<String>,
    pub agent: Option<Address>,
    pub block_number: Option<u64>,
    pub emergency_stop: bool,
    pub poll_interval_secs: u64,
    pub started_at: DateTime<Utc>,
    pub uptime_secs: u64,
    pub active_battles: Option<usize>,
    pub pending_battles: Option<usize>,
    pub last_cycle: Option<CycleSummary>,
}

/// Successes and failures of a settle-all run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// One pass over the arena's battle lists
struct Monitored {
    /// Unique ids in enumeration order
    ids: Vec<U256>,
    /// Ids the arena reports expired
    expired: Vec<U256>,
    /// Lists that could not be read
    failed: Vec<&'static str>,
}

pub struct Agent {
    config: Config,
    chain: Arc<dyn ArenaChain>,
    analyzer: PoolAnalyzer,
    engine: SettlementEngine,
    lifi: LifiClient,
    context: Arc<AgentContext>,
    /// Held for the length of a cycle; also counts cycles
    cycle_lock: Mutex<u64>,
}

impl Agent {
    /// Connect to the configured RPC with the configured key
    pub fn from_config(config: Config) -> Result<Self> {
        config.validate()?;
        let wallet = AgentWallet::from_config(&config)?;
        let chain: Arc<dyn ArenaChain> = Arc::new(RpcArena::new(&config, &wallet)?);
        Self::new(config, chain)
    }

    pub fn new(config: Config, chain: Arc<dyn ArenaChain>) -> Result<Self> {
        let analyzer = PoolAnalyzer::new(chain.clone(), config.entry_score_threshold);
        let engine = SettlementEngine::new(chain.clone(), &config);
        let lifi = LifiClient::new(&config.lifi_api_url, config.lifi_api_key.clone())?;
        let context = Arc::new(AgentContext::new(config.log_buffer_size));

        Ok(Self {
            config,
            chain,
            analyzer,
            engine,
            lifi,
            context,
            cycle_lock: Mutex::new(0),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn context(&self) -> &Arc<AgentContext> {
        &self.context
    }

    // ============================================
    // MONITOR
    // ============================================

    async fn enumerate(
        &self,
        label: &'static str,
        ids: Result<Vec<U256>>,
        failed: &mut Vec<&'static str>,
    ) -> Vec<U256> {
        match ids {
            Ok(ids) => {
                debug!("{} {} battles", ids.len(), label);
                ids
            }
            Err(e) => {
                self.context
                    .error(format!("Failed to list {} battles: {}", label, e))
                    .await;
                failed.push(label);
                Vec::new()
            }
        }
    }

    async fn monitor(&self) -> Monitored {
        let mut failed = Vec::new();
        let active = self
            .enumerate("active", self.chain.active_battle_ids().await, &mut failed)
            .await;
        let pending = self
            .enumerate("pending", self.chain.pending_battle_ids().await, &mut failed)
            .await;
        let expired = self
            .enumerate("expired", self.chain.expired_battle_ids().await, &mut failed)
            .await;

        let mut ids: Vec<U256> = Vec::with_capacity(active.len() + pending.len() + expired.len());
        for id in active.iter().chain(&pending).chain(&expired) {
            if !ids.contains(id) {
                ids.push(*id);
            }
        }
        Monitored {
            ids,
            expired,
            failed,
        }
    }

    // ============================================
    // DECIDE
    // ============================================

    fn decide(&self, analysis: &BattleAnalysis, reported_expired: bool) -> Decision {
        let battle = &analysis.battle;
        let threshold = self.analyzer.entry_threshold();

        let (action, reason) = match battle.status {
            BattleStatus::Active if analysis.is_expired || reported_expired => (
                DecisionAction::Settle,
                format!(
                    "Expired - estimated resolver reward {}",
                    analysis.resolver_reward
                ),
            ),
            BattleStatus::Pending if analysis.worth_entering(threshold) => {
                (DecisionAction::ConsiderEntry, analysis.recommendation.clone())
            }
            BattleStatus::Active | BattleStatus::Pending => {
                (DecisionAction::Monitor, analysis.recommendation.clone())
            }
            _ => (DecisionAction::Skip, analysis.recommendation.clone()),
        };

        Decision {
            battle_id: battle.id,
            action,
            entry_score: score_battle_for_entry(analysis),
            reason,
            timestamp: Utc::now(),
        }
    }

    // ============================================
    // ACT
    // ============================================

    async fn record_settlement(&self, battle_id: U256, result: &SettlementResult) {
        self.context
            .record_transaction(TxEvidence {
                battle_id,
                tx_hash: result.tx_hash(),
                mode: self.engine.mode(),
                outcome: result.to_string(),
                success: result.is_success(),
                timestamp: Utc::now(),
            })
            .await;

        let message = format!("Battle {}: {}", battle_id, result);
        if result.is_success() {
            self.context.info(message).await;
        } else {
            self.context.error(message).await;
        }
    }

    async fn act(&self, battle_id: U256) -> SettlementResult {
        let result = self.engine.settle(battle_id).await;
        self.record_settlement(battle_id, &result).await;
        result
    }

    // ============================================
    // ROUTE
    // ============================================

    /// Fetch a LI.FI quote and record it
    pub async fn quote(&self, request: &QuoteRequest) -> Result<LifiQuote> {
        let quote = self.lifi.quote(request).await?;
        self.context.record_route(quote.to_route_record()).await;
        Ok(quote)
    }

    async fn route(&self) {
        let Some(check) = self.config.route_check.clone() else {
            return;
        };
        let Some(from_address) = self.chain.agent_address() else {
            self.context
                .warn("Route check configured but no agent address to quote for")
                .await;
            return;
        };
        let amount = match U256::from_str(&check.amount) {
            Ok(amount) => amount,
            Err(e) => {
                self.context
                    .error(format!("Invalid ROUTE_AMOUNT {}: {}", check.amount, e))
                    .await;
                return;
            }
        };

        let request = QuoteRequest {
            from_chain: check.from_chain,
            to_chain: check.to_chain,
            from_token: check.from_token,
            to_token: check.to_token,
            from_amount: amount,
            from_address,
        };

        match self.quote(&request).await {
            Ok(quote) => {
                self.context
                    .info(format!(
                        "Route {} -> {} via {}: {} out",
                        request.from_chain, request.to_chain, quote.tool, quote.estimate.to_amount
                    ))
                    .await
            }
            Err(e) => self.context.warn(format!("Route quote failed: {}", e)).await,
        }
    }

    // ============================================
    // CYCLE
    // ============================================

    /// One monitor -> decide -> act -> route pass. Concurrent callers wait
    /// for the running cycle to finish.
    pub async fn run_cycle(&self) -> CycleSummary {
        let mut counter = self.cycle_lock.lock().await;
        *counter += 1;
        let cycle = *counter;

        let started = Instant::now();
        let mut summary = CycleSummary {
            cycle,
            started_at: Some(Utc::now()),
            ..CycleSummary::default()
        };
        self.context.info(format!("🔄 Cycle {} started", cycle)).await;

        let Monitored {
            ids,
            expired: reported_expired,
            ..
        } = self.monitor().await;
        summary.battles_seen = ids.len();

        let mut decisions = Vec::with_capacity(ids.len());
        for id in ids {
            let analysis = match self.analyzer.analyze(id).await {
                Ok(analysis) => analysis,
                Err(e) => {
                    summary.read_errors += 1;
                    self.context.error(format!("{:#}", e)).await;
                    continue;
                }
            };

            let decision = self.decide(&analysis, reported_expired.contains(&id));
            match decision.action {
                DecisionAction::Settle => {
                    self.context.info(format!("⚖️  Battle {}: {}", id, decision.reason)).await;
                    if self.act(id).await.is_success() {
                        summary.settled += 1;
                    } else {
                        summary.failures += 1;
                    }
                }
                DecisionAction::ConsiderEntry => {
                    summary.entry_candidates += 1;
                    self.context
                        .info(format!(
                            "🎯 Battle {} scores {}/100: {}",
                            id, decision.entry_score, decision.reason
                        ))
                        .await;
                }
                DecisionAction::Monitor | DecisionAction::Skip => {
                    debug!("Battle {}: {}", id, decision.reason);
                }
            }
            decisions.push(decision);
        }
        self.context.set_decisions(decisions).await;

        self.route().await;

        summary.duration_ms = started.elapsed().as_millis() as u64;
        self.context
            .info(format!(
                "✓ Cycle {} done: {} battles, {} settled, {} failed, {} read errors ({}ms)",
                cycle,
                summary.battles_seen,
                summary.settled,
                summary.failures,
                summary.read_errors,
                summary.duration_ms
            ))
            .await;
        self.context.set_last_cycle(summary.clone()).await;
        summary
    }

    /// Poll until ctrl-c
    pub async fn run(&self) -> Result<()> {
        let period = Duration::from_secs(self.config.poll_interval_secs.max(1));
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        info!(
            "🚀 Agent polling every {}s in {} mode",
            period.as_secs(),
            self.config.execution_mode
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.run_cycle().await;
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("🛑 Shutdown requested");
                    return Ok(());
                }
            }
        }
    }

    // ============================================
    // ON-DEMAND
    // ============================================

    pub async fn status(&self) -> AgentStatus {
        let started_at = self.context.started_at();
        let block_number = self.chain.block_number().await.ok();
        let active_battles = self.chain.active_battle_ids().await.ok().map(|ids| ids.len());
        let pending_battles = self.chain.pending_battle_ids().await.ok().map(|ids| ids.len());

        AgentStatus {
            version: env!("CARGO_PKG_VERSION").to_string(),
            mode: self.config.execution_mode,
            chain_id: self.config.chain_id,
            arena: self.config.battle_arena_address.clone(),
            agent: self.chain.agent_address(),
            block_number,
            emergency_stop: self.config.emergency_stop,
            poll_interval_secs: self.config.poll_interval_secs,
            started_at,
            uptime_secs: (Utc::now() - started_at).num_seconds().max(0) as u64,
            active_battles,
            pending_battles,
            last_cycle: self.context.last_cycle().await,
        }
    }

    /// Unreadable vaults are logged and left out
    pub async fn vault_summaries(&self) -> Vec<VaultSummary> {
        let mut summaries = Vec::new();
        for vault in self.config.vaults() {
            match self.chain.vault_summary(vault).await {
                Ok(summary) => summaries.push(summary),
                Err(e) => {
                    self.context
                        .warn(format!("Vault {:?} unreadable: {}", vault, e))
                        .await
                }
            }
        }
        summaries
    }

    pub async fn analyze(&self, id: U256) -> Result<BattleAnalysis> {
        self.analyzer.analyze(id).await
    }

    /// Every listed battle; unreadable ones are logged and skipped. Err if
    /// any battle list could not be read.
    pub async fn analyze_all(&self) -> Result<Vec<BattleAnalysis>> {
        let monitored = self.monitor().await;
        if !monitored.failed.is_empty() {
            return Err(eyre!(
                "Failed to list {} battles",
                monitored.failed.join(", ")
            ));
        }

        let ids = monitored.ids;
        let mut analyses = Vec::with_capacity(ids.len());
        for id in ids {
            match self.analyzer.analyze(id).await {
                Ok(analysis) => analyses.push(analysis),
                Err(e) => self.context.error(format!("{:#}", e)).await,
            }
        }
        Ok(analyses)
    }

    /// Settle one battle; Err unless it is expired and the settlement succeeds
    pub async fn settle(&self, id: U256) -> Result<SettlementResult> {
        let analysis = self.analyzer.analyze(id).await?;
        let reported_expired = self.chain.is_expired(id).await.unwrap_or(false);

        if analysis.battle.status != BattleStatus::Active {
            return Err(eyre!("Battle {} is {}, not active", id, analysis.battle.status));
        }
        if !(analysis.is_expired || reported_expired) {
            return Err(eyre!(
                "Battle {} has not expired ({}s remaining)",
                id,
                analysis.time_remaining
            ));
        }

        let result = self.act(id).await;
        if result.is_success() {
            Ok(result)
        } else {
            Err(eyre!("Settlement of battle {} failed: {}", id, result))
        }
    }

    /// Battles the arena reports as expired and unsettled
    pub async fn expired_battles(&self) -> Result<Vec<U256>> {
        self.chain.expired_battle_ids().await
    }

    /// Settle each battle in turn, counting outcomes; `on_result` sees every attempt
    pub async fn settle_all<F>(&self, ids: &[U256], mut on_result: F) -> BatchOutcome
    where
        F: FnMut(U256, &SettlementResult),
    {
        let mut outcome = BatchOutcome::default();
        for id in ids {
            let result = self.act(*id).await;
            outcome.attempted += 1;
            if result.is_success() {
                outcome.succeeded += 1;
            } else {
                outcome.failed += 1;
            }
            on_result(*id, &result);
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::mock::{battle, MockArena};
    use super::context::LogLevel;

    fn agent_with(arena: MockArena, mode: ExecutionMode) -> (Arc<MockArena>, Agent) {
        let arena = Arc::new(arena);
        let config = Config {
            execution_mode: mode,
            battle_arena_address: Some(format!("{:?}", Address::repeat_byte(0xBA))),
            ..Config::default()
        };
        let agent = Agent::new(config, arena.clone()).unwrap();
        (arena, agent)
    }

    /// Active battle 1 started at 1000 with a 3600s duration: long expired
    fn expired_arena() -> MockArena {
        let mut arena = MockArena::new()
            .with_battle(battle(1, BattleStatus::Active))
            .with_battle(battle(2, BattleStatus::Pending));
        arena.expired.push(U256::from(1u64));
        arena
    }

    #[tokio::test]
    async fn test_cycle_settles_expired_battles() {
        let (arena, agent) = agent_with(expired_arena(), ExecutionMode::Production);

        let summary = agent.run_cycle().await;
        assert_eq!(summary.cycle, 1);
        assert_eq!(summary.battles_seen, 2);
        assert_eq!(summary.settled, 1);
        assert_eq!(summary.failures, 0);
        assert_eq!(arena.settled_ids(), vec![U256::from(1u64)]);

        let txs = agent.context().transactions().await;
        assert_eq!(txs.len(), 1);
        assert!(txs[0].tx_hash.is_some());

        let decisions = agent.context().decisions().await;
        assert_eq!(decisions[0].action, DecisionAction::Settle);
        // pending, one hour long
        assert_eq!(decisions[1].action, DecisionAction::ConsiderEntry);
    }

    #[tokio::test]
    async fn test_simulation_mode_does_not_send() {
        let (arena, agent) = agent_with(expired_arena(), ExecutionMode::Simulation);

        let summary = agent.run_cycle().await;
        assert_eq!(summary.settled, 1);
        assert!(arena.settled_ids().is_empty());

        let txs = agent.context().transactions().await;
        assert!(txs[0].tx_hash.is_none());
        assert!(txs[0].outcome.contains("would settle"));
    }

    #[tokio::test]
    async fn test_cycle_continues_past_failures() {
        let mut arena = expired_arena()
            .with_battle(battle(3, BattleStatus::Active))
            .with_battle(battle(4, BattleStatus::Active));
        arena.expired.push(U256::from(3u64));
        arena.expired.push(U256::from(4u64));
        arena.broken.insert(U256::from(3u64));
        arena.reverting.insert(U256::from(4u64));
        let (arena, agent) = agent_with(arena, ExecutionMode::Production);

        let summary = agent.run_cycle().await;
        assert_eq!(summary.battles_seen, 4);
        assert_eq!(summary.read_errors, 1);
        assert_eq!(summary.settled, 1);
        assert_eq!(summary.failures, 1);
        assert_eq!(arena.settled_ids(), vec![U256::from(1u64)]);

        let logs = agent.context().logs().await;
        assert!(logs.iter().any(|l| l.level == LogLevel::Error && l.message.contains("battle 3")));
    }

    #[tokio::test]
    async fn test_enumeration_failure_is_logged() {
        let mut arena = MockArena::new();
        arena.fail_enumeration = true;
        let (_, agent) = agent_with(arena, ExecutionMode::Simulation);

        let summary = agent.run_cycle().await;
        assert_eq!(summary.battles_seen, 0);
        let errors = agent
            .context()
            .logs()
            .await
            .into_iter()
            .filter(|l| l.level == LogLevel::Error)
            .count();
        assert_eq!(errors, 3);
    }

    #[tokio::test]
    async fn test_analyze_all_errors_when_lists_unreadable() {
        let mut arena = MockArena::new();
        arena.fail_enumeration = true;
        let (_, agent) = agent_with(arena, ExecutionMode::Simulation);

        let err = agent.analyze_all().await.unwrap_err();
        assert!(err.to_string().contains("active, pending, expired"));

        let (_, agent) = agent_with(MockArena::new(), ExecutionMode::Simulation);
        assert!(agent.analyze_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_analyze_all_skips_unreadable_battle() {
        let mut arena = MockArena::new()
            .with_battle(battle(1, BattleStatus::Active))
            .with_battle(battle(2, BattleStatus::Pending));
        arena.broken.insert(U256::from(1u64));
        let (_, agent) = agent_with(arena, ExecutionMode::Simulation);

        let analyses = agent.analyze_all().await.unwrap();
        assert_eq!(analyses.len(), 1);
        assert_eq!(analyses[0].battle.id, U256::from(2u64));
    }

    #[tokio::test]
    async fn test_short_pending_battle_is_entry_candidate() {
        let mut pending = battle(7, BattleStatus::Pending);
        pending.duration = 1_800;
        let (_, agent) = agent_with(MockArena::new().with_battle(pending), ExecutionMode::Simulation);

        let summary = agent.run_cycle().await;
        assert_eq!(summary.entry_candidates, 1);

        let decisions = agent.context().decisions().await;
        assert_eq!(decisions[0].action, DecisionAction::ConsiderEntry);
        assert_eq!(decisions[0].entry_score, 70);
        assert_eq!(decisions[0].reason, "Worth considering for entry");
    }

    #[tokio::test]
    async fn test_cycles_are_counted() {
        let (_, agent) = agent_with(MockArena::new(), ExecutionMode::Simulation);
        agent.run_cycle().await;
        let second = agent.run_cycle().await;
        assert_eq!(second.cycle, 2);
        assert_eq!(agent.context().last_cycle().await.map(|c| c.cycle), Some(2));
    }

    #[tokio::test]
    async fn test_settle_rejects_running_battle() {
        let mut running = battle(5, BattleStatus::Active);
        running.start_time = u64::MAX / 2;
        let (arena, agent) = agent_with(MockArena::new().with_battle(running), ExecutionMode::Production);

        assert!(agent.settle(U256::from(5u64)).await.is_err());
        assert!(arena.settled_ids().is_empty());

        let (_, agent) = agent_with(expired_arena(), ExecutionMode::Production);
        let result = agent.settle(U256::from(1u64)).await.unwrap();
        assert!(result.tx_hash().is_some());
    }

    #[tokio::test]
    async fn test_settle_all_counts_outcomes() {
        let mut arena = expired_arena().with_battle(battle(3, BattleStatus::Active));
        arena.expired.push(U256::from(3u64));
        arena.reverting.insert(U256::from(3u64));
        let (_, agent) = agent_with(arena, ExecutionMode::Production);

        let ids = agent.expired_battles().await.unwrap();
        let mut seen = Vec::new();
        let outcome = agent.settle_all(&ids, |id, _| seen.push(id)).await;
        assert_eq!(seen, ids);
        assert_eq!(
            outcome,
            BatchOutcome {
                attempted: 2,
                succeeded: 1,
                failed: 1
            }
        );
    }

    #[tokio::test]
    async fn test_vault_summaries_skip_unreadable() {
        let good = Address::repeat_byte(0x01);
        let bad = Address::repeat_byte(0x02);
        let mut arena = MockArena::new();
        arena.vaults.insert(
            good,
            VaultSummary {
                address: good,
                name: "Arena Vault".to_string(),
                asset: Address::ZERO,
                total_assets: U256::from(10u64),
                total_supply: U256::from(10u64),
                agent_shares: None,
            },
        );
        let arena = Arc::new(arena);
        let config = Config {
            vault_addresses: vec![format!("{:?}", good), format!("{:?}", bad)],
            ..Config::default()
        };
        let agent = Agent::new(config, arena).unwrap();

        let vaults = agent.vault_summaries().await;
        assert_eq!(vaults.len(), 1);
        assert_eq!(vaults[0].name, "Arena Vault");
    }

    #[tokio::test]
    async fn test_status_reports_mode_and_counts() {
        let (_, agent) = agent_with(expired_arena(), ExecutionMode::DryRun);
        let status = agent.status().await;
        assert_eq!(status.mode, ExecutionMode::DryRun);
        assert_eq!(status.block_number, Some(19_000_000));
        assert_eq!(status.active_battles, Some(1));
        assert_eq!(status.pending_battles, Some(1));
        assert!(status.last_cycle.is_none());
    }
}
