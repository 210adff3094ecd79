//! Cross-chain routing
//!
//! Responsible for:
//! - LI.FI quotes (swap + bridge routes)
//! - CCTP burn calldata and Circle attestation lookups
//!
//! Nothing here signs or sends; routes are assembled and recorded for the
//! operator and the dashboard.

pub mod cctp;
pub mod lifi;

use alloy_primitives::U256;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use cctp::{AttestationClient, AttestationStatus};
pub use lifi::{LifiClient, LifiQuote, QuoteRequest};

/// Timeout for routing service calls
pub const ROUTE_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteProvider {
    Lifi,
    Cctp,
}

impl std::fmt::Display for RouteProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteProvider::Lifi => write!(f, "LI.FI"),
            RouteProvider::Cctp => write!(f, "CCTP"),
        }
    }
}

/// One assembled route, as shown on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRecord {
    pub provider: RouteProvider,
    pub from_chain: u64,
    pub to_chain: u64,
    pub token: String,
    #[serde(with = "crate::decimal")]
    pub amount: U256,
    #[serde(with = "crate::decimal::option")]
    pub estimated_output: Option<U256>,
    /// Bridge or DEX the route goes through
    pub tool: Option<String>,
    pub timestamp: DateTime<Utc>,
}
