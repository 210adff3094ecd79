//! Agent context - everything the dashboard reads.
//!
//! Created once at startup, owned by the agent through an `Arc`, read by the
//! HTTP layer. The log buffer is bounded and evicts its oldest entries.
//! Transaction evidence is append-only until cleared on demand; decisions
//! hold the latest cycle and routes a bounded history.

use alloy_primitives::{B256, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::bridge::RouteRecord;
use crate::config::ExecutionMode;

/// Cap on retained route quotes
const ROUTE_HISTORY_LIMIT: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionAction {
    Settle,
    ConsiderEntry,
    Monitor,
    Skip,
}

/// What the agent decided about one battle in one cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    #[serde(with = "crate::decimal")]
    pub battle_id: U256,
    pub action: DecisionAction,
    pub entry_score: u8,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

/// Evidence of one settlement attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxEvidence {
    #[serde(with = "crate::decimal")]
    pub battle_id: U256,
    pub tx_hash: Option<B256>,
    pub mode: ExecutionMode,
    pub outcome: String,
    pub success: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CycleSummary {
    pub cycle: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub duration_ms: u64,
    pub battles_seen: usize,
    pub settled: usize,
    /// Settlement attempts that did not succeed
    pub failures: usize,
    /// Battles whose details could not be read
    pub read_errors: usize,
    pub entry_candidates: usize,
}

pub struct AgentContext {
    log_capacity: usize,
    logs: RwLock<VecDeque<LogEntry>>,
    decisions: RwLock<Vec<Decision>>,
    routes: RwLock<VecDeque<RouteRecord>>,
    transactions: RwLock<Vec<TxEvidence>>,
    last_cycle: RwLock<Option<CycleSummary>>,
    started_at: DateTime<Utc>,
}

fn push_bounded<T>(queue: &mut VecDeque<T>, item: T, capacity: usize) {
    while queue.len() >= capacity.max(1) {
        queue.pop_front();
    }
    queue.push_back(item);
}

impl AgentContext {
    pub fn new(log_capacity: usize) -> Self {
        Self {
            log_capacity: log_capacity.max(1),
            logs: RwLock::new(VecDeque::new()),
            decisions: RwLock::new(Vec::new()),
            routes: RwLock::new(VecDeque::new()),
            transactions: RwLock::new(Vec::new()),
            last_cycle: RwLock::new(None),
            started_at: Utc::now(),
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    // ========== Logs ==========

    /// Append to the buffer and mirror to tracing
    pub async fn log(&self, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            LogLevel::Info => info!("{}", message),
            LogLevel::Warn => warn!("{}", message),
            LogLevel::Error => error!("{}", message),
        }

        let entry = LogEntry {
            timestamp: Utc::now(),
            level,
            message,
        };
        let mut logs = self.logs.write().await;
        push_bounded(&mut logs, entry, self.log_capacity);
    }

    pub async fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message).await
    }

    pub async fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message).await
    }

    pub async fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message).await
    }

    pub async fn logs(&self) -> Vec<LogEntry> {
        self.logs.read().await.iter().cloned().collect()
    }

    /// Returns how many entries were dropped
    pub async fn clear_logs(&self) -> usize {
        let mut logs = self.logs.write().await;
        let dropped = logs.len();
        logs.clear();
        dropped
    }

    // ========== Decisions ==========

    /// Replace the previous cycle's decisions
    pub async fn set_decisions(&self, decisions: Vec<Decision>) {
        *self.decisions.write().await = decisions;
    }

    pub async fn decisions(&self) -> Vec<Decision> {
        self.decisions.read().await.clone()
    }

    // ========== Routes ==========

    pub async fn record_route(&self, route: RouteRecord) {
        let mut routes = self.routes.write().await;
        push_bounded(&mut routes, route, ROUTE_HISTORY_LIMIT);
    }

    pub async fn routes(&self) -> Vec<RouteRecord> {
        self.routes.read().await.iter().cloned().collect()
    }

    // ========== Transactions ==========

    pub async fn record_transaction(&self, evidence: TxEvidence) {
        self.transactions.write().await.push(evidence);
    }

    pub async fn transactions(&self) -> Vec<TxEvidence> {
        self.transactions.read().await.clone()
    }

    /// Returns how many records were dropped
    pub async fn clear_transactions(&self) -> usize {
        let mut txs = self.transactions.write().await;
        let dropped = txs.len();
        txs.clear();
        dropped
    }

    // ========== Cycles ==========

    pub async fn set_last_cycle(&self, summary: CycleSummary) {
        *self.last_cycle.write().await = Some(summary);
    }

    pub async fn last_cycle(&self) -> Option<CycleSummary> {
        self.last_cycle.read().await.clone()
    }
}
