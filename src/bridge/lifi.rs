//! LI.FI Quote Client
//!
//! Fetches a single swap/bridge quote and keeps the parts the operator needs:
//! tool, expected output, gas cost and the transaction target.
//!
//! API: GET {LIFI_API_URL}/quote?fromChain=..&toChain=..&fromToken=..&toToken=..&fromAmount=..&fromAddress=..

use alloy_primitives::{Address, U256};
use chrono::Utc;
use eyre::{eyre, Result, WrapErr};
use reqwest::Client;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use super::{RouteProvider, RouteRecord, ROUTE_TIMEOUT_SECS};

const API_KEY_HEADER: &str = "x-lifi-api-key";

// ============================================
// REQUEST
// ============================================

#[derive(Debug, Clone, PartialEq)]
pub struct QuoteRequest {
    pub from_chain: u64,
    pub to_chain: u64,
    pub from_token: String,
    pub to_token: String,
    pub from_amount: U256,
    pub from_address: Address,
}

impl QuoteRequest {
    pub fn query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("fromChain", self.from_chain.to_string()),
            ("toChain", self.to_chain.to_string()),
            ("fromToken", self.from_token.clone()),
            ("toToken", self.to_token.clone()),
            ("fromAmount", self.from_amount.to_string()),
            ("fromAddress", format!("{:?}", self.from_address)),
        ]
    }
}

// ============================================
// API RESPONSE TYPES
// ============================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifiQuote {
    pub tool: String,
    pub action: QuoteAction,
    pub estimate: QuoteEstimate,
    pub transaction_request: Option<QuoteTransaction>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteAction {
    pub from_chain_id: u64,
    pub to_chain_id: u64,
    pub from_token: QuoteToken,
    pub to_token: QuoteToken,
    pub from_amount: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuoteToken {
    pub address: String,
    pub symbol: String,
    pub decimals: u8,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteEstimate {
    pub to_amount: String,
    pub to_amount_min: Option<String>,
    /// Seconds
    pub execution_duration: Option<f64>,
    #[serde(default)]
    pub gas_costs: Vec<GasCost>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GasCost {
    #[serde(rename = "amountUSD")]
    pub amount_usd: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteTransaction {
    pub to: Option<String>,
    pub data: Option<String>,
    pub value: Option<String>,
    pub gas_limit: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LifiError {
    message: Option<String>,
}

impl LifiQuote {
    pub fn to_amount(&self) -> Option<U256> {
        U256::from_str(&self.estimate.to_amount).ok()
    }

    /// Sum of the quoted gas costs in USD
    pub fn gas_cost_usd(&self) -> f64 {
        self.estimate
            .gas_costs
            .iter()
            .filter_map(|c| c.amount_usd.as_deref())
            .filter_map(|raw| raw.parse::<f64>().ok())
            .sum()
    }

    pub fn to_route_record(&self) -> RouteRecord {
        RouteRecord {
            provider: RouteProvider::Lifi,
            from_chain: self.action.from_chain_id,
            to_chain: self.action.to_chain_id,
            token: self.action.from_token.symbol.clone(),
            amount: U256::from_str(&self.action.from_amount).unwrap_or_default(),
            estimated_output: self.to_amount(),
            tool: Some(self.tool.clone()),
            timestamp: Utc::now(),
        }
    }
}

// ============================================
// CLIENT
// ============================================

pub struct LifiClient {
    http_client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl LifiClient {
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(ROUTE_TIMEOUT_SECS))
            .build()
            .wrap_err("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub async fn quote(&self, request: &QuoteRequest) -> Result<LifiQuote> {
        let url = format!("{}/quote", self.base_url);
        debug!("LI.FI quote {} -> {}", request.from_chain, request.to_chain);

        let mut call = self.http_client.get(&url).query(&request.query());
        if let Some(ref key) = self.api_key {
            call = call.header(API_KEY_HEADER, key);
        }

        let response = call
            .send()
            .await
            .map_err(|e| eyre!("LI.FI request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<LifiError>(&body)
                .ok()
                .and_then(|e| e.message)
                .unwrap_or(body);
            return Err(eyre!("LI.FI returned {}: {}", status, message));
        }

        response
            .json::<LifiQuote>()
            .await
            .map_err(|e| eyre!("Failed to parse LI.FI quote: {}", e))
    }
}
