//! Circle CCTP
//!
//! Burn-and-mint USDC transfers: assemble `depositForBurn` calldata for the
//! TokenMessenger on the source chain, then look up Circle's attestation for
//! the emitted message. Relaying `receiveMessage` on the destination chain is
//! left to the operator.

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_sol_types::{sol, SolCall};
use chrono::Utc;
use eyre::{eyre, Result, WrapErr};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{RouteProvider, RouteRecord, ROUTE_TIMEOUT_SECS};

sol! {
    interface ITokenMessenger {
        function depositForBurn(
            uint256 amount,
            uint32 destinationDomain,
            bytes32 mintRecipient,
            address burnToken
        ) external returns (uint64 nonce);
    }
}

// ============================================
// DOMAINS
// ============================================

/// Circle's chain identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CctpDomain {
    Ethereum,
    Avalanche,
    Optimism,
    Arbitrum,
    Base,
    Polygon,
}

impl CctpDomain {
    pub fn id(&self) -> u32 {
        match self {
            CctpDomain::Ethereum => 0,
            CctpDomain::Avalanche => 1,
            CctpDomain::Optimism => 2,
            CctpDomain::Arbitrum => 3,
            CctpDomain::Base => 6,
            CctpDomain::Polygon => 7,
        }
    }

    /// Mainnets and their public testnets share a domain
    pub fn from_chain_id(chain_id: u64) -> Option<Self> {
        match chain_id {
            1 | 11155111 => Some(CctpDomain::Ethereum),
            43114 | 43113 => Some(CctpDomain::Avalanche),
            10 | 11155420 => Some(CctpDomain::Optimism),
            42161 | 421614 => Some(CctpDomain::Arbitrum),
            8453 | 84532 => Some(CctpDomain::Base),
            137 | 80002 => Some(CctpDomain::Polygon),
            _ => None,
        }
    }

    pub fn mainnet_chain_id(&self) -> u64 {
        match self {
            CctpDomain::Ethereum => 1,
            CctpDomain::Avalanche => 43114,
            CctpDomain::Optimism => 10,
            CctpDomain::Arbitrum => 42161,
            CctpDomain::Base => 8453,
            CctpDomain::Polygon => 137,
        }
    }
}

impl std::fmt::Display for CctpDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} (domain {})", self, self.id())
    }
}

// ============================================
// BURN
// ============================================

#[derive(Debug, Clone, PartialEq)]
pub struct BurnRequest {
    pub source_chain: u64,
    pub destination: CctpDomain,
    pub amount: U256,
    pub recipient: Address,
    pub burn_token: Address,
}

impl BurnRequest {
    pub fn new(
        source_chain: u64,
        destination_chain: u64,
        amount: U256,
        recipient: Address,
        burn_token: Address,
    ) -> Result<Self> {
        if CctpDomain::from_chain_id(source_chain).is_none() {
            return Err(eyre!("Chain {} is not a CCTP source", source_chain));
        }
        let destination = CctpDomain::from_chain_id(destination_chain)
            .ok_or_else(|| eyre!("Chain {} is not a CCTP destination", destination_chain))?;
        if amount.is_zero() {
            return Err(eyre!("Burn amount must be positive"));
        }

        Ok(Self {
            source_chain,
            destination,
            amount,
            recipient,
            burn_token,
        })
    }

    /// Recipient left-padded to 32 bytes
    pub fn mint_recipient(&self) -> B256 {
        self.recipient.into_word()
    }

    /// `depositForBurn` calldata for the source-chain TokenMessenger
    pub fn calldata(&self) -> Bytes {
        ITokenMessenger::depositForBurnCall {
            amount: self.amount,
            destinationDomain: self.destination.id(),
            mintRecipient: self.mint_recipient(),
            burnToken: self.burn_token,
        }
        .abi_encode()
        .into()
    }

    pub fn to_route_record(&self) -> RouteRecord {
        RouteRecord {
            provider: RouteProvider::Cctp,
            from_chain: self.source_chain,
            to_chain: self.destination.mainnet_chain_id(),
            token: "USDC".to_string(),
            amount: self.amount,
            estimated_output: Some(self.amount),
            tool: Some("depositForBurn".to_string()),
            timestamp: Utc::now(),
        }
    }
}

/// Attestation lookup key: keccak256 of the MessageSent payload
pub fn message_hash(message: &[u8]) -> B256 {
    keccak256(message)
}

// ============================================
// ATTESTATION
// ============================================

#[derive(Debug, Deserialize)]
struct AttestationResponse {
    attestation: Option<String>,
    status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AttestationStatus {
    /// Circle has not seen the message yet
    NotFound,
    Pending { detail: String },
    Complete { attestation: String },
}

pub struct AttestationClient {
    http_client: Client,
    base_url: String,
}

impl AttestationClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(ROUTE_TIMEOUT_SECS))
            .build()
            .wrap_err("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Single lookup, no polling
    pub async fn fetch(&self, message_hash: B256) -> Result<AttestationStatus> {
        let url = format!("{}/attestations/{}", self.base_url, message_hash);
        debug!("Attestation lookup: {}", url);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| eyre!("Attestation request failed: {}", e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(AttestationStatus::NotFound);
        }
        if !response.status().is_success() {
            return Err(eyre!("Attestation service returned {}", response.status()));
        }

        let body: AttestationResponse = response
            .json()
            .await
            .map_err(|e| eyre!("Failed to parse attestation response: {}", e))?;

        Ok(match (body.status.as_deref(), body.attestation) {
            (Some("complete"), Some(attestation)) if attestation.starts_with("0x") => {
                AttestationStatus::Complete { attestation }
            }
            (status, _) => AttestationStatus::Pending {
                detail: status.unwrap_or("unknown").to_string(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::lifi::tests::serve;
    use axum::{extract::Path, http::StatusCode as HttpStatus, routing::get, Json, Router};
    use std::str::FromStr;

    #[test]
    fn test_domain_ids() {
        assert_eq!(CctpDomain::from_chain_id(1).map(|d| d.id()), Some(0));
        assert_eq!(CctpDomain::from_chain_id(43114).map(|d| d.id()), Some(1));
        assert_eq!(CctpDomain::from_chain_id(10).map(|d| d.id()), Some(2));
        assert_eq!(CctpDomain::from_chain_id(42161).map(|d| d.id()), Some(3));
        assert_eq!(CctpDomain::from_chain_id(8453).map(|d| d.id()), Some(6));
        assert_eq!(CctpDomain::from_chain_id(137).map(|d| d.id()), Some(7));
        assert_eq!(CctpDomain::from_chain_id(56), None);
    }

    #[test]
    fn test_deposit_for_burn_calldata() {
        let recipient = Address::from_str("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266").unwrap();
        let usdc = Address::from_str("0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913").unwrap();
        let burn = BurnRequest::new(8453, 42161, U256::from(1_000_000u64), recipient, usdc).unwrap();

        let data = burn.calldata();
        assert_eq!(&data[..4], ITokenMessenger::depositForBurnCall::SELECTOR.as_slice());
        assert_eq!(data.len(), 4 + 4 * 32);

        let decoded = ITokenMessenger::depositForBurnCall::abi_decode(&data).unwrap();
        assert_eq!(decoded.amount, U256::from(1_000_000u64));
        assert_eq!(decoded.destinationDomain, 3);
        assert_eq!(&decoded.mintRecipient[..12], &[0u8; 12]);
        assert_eq!(&decoded.mintRecipient[12..], recipient.as_slice());
        assert_eq!(decoded.burnToken, usdc);
    }

    #[test]
    fn test_burn_validation() {
        let a = Address::repeat_byte(1);
        assert!(BurnRequest::new(56, 42161, U256::from(1u64), a, a).is_err());
        assert!(BurnRequest::new(8453, 56, U256::from(1u64), a, a).is_err());
        assert!(BurnRequest::new(8453, 42161, U256::ZERO, a, a).is_err());
    }

    #[test]
    fn test_message_hash_is_keccak() {
        assert_eq!(message_hash(b""), keccak256([]));
        assert_ne!(message_hash(b"a"), message_hash(b"b"));
    }

    #[tokio::test]
    async fn test_attestation_states() {
        let complete = B256::repeat_byte(0xC0);
        let pending = B256::repeat_byte(0xB0);
        let complete_path = complete.to_string();
        let pending_path = pending.to_string();

        let app = Router::new().route(
            "/attestations/:hash",
            get(move |Path(hash): Path<String>| {
                let complete_path = complete_path.clone();
                let pending_path = pending_path.clone();
                async move {
                    if hash == complete_path {
                        Ok(Json(serde_json::json!({"attestation": "0xabcd", "status": "complete"})))
                    } else if hash == pending_path {
                        Ok(Json(serde_json::json!({"attestation": "PENDING", "status": "pending_confirmations"})))
                    } else {
                        Err(HttpStatus::NOT_FOUND)
                    }
                }
            }),
        );
        let base = serve(app).await;
        let client = AttestationClient::new(&base).unwrap();

        let status = client.fetch(complete).await.unwrap();
        assert_eq!(
            status,
            AttestationStatus::Complete {
                attestation: "0xabcd".to_string()
            }
        );
        assert!(matches!(status, AttestationStatus::Complete { .. }));

        assert_eq!(
            client.fetch(pending).await.unwrap(),
            AttestationStatus::Pending {
                detail: "pending_confirmations".to_string()
            }
        );
        assert_eq!(
            client.fetch(B256::ZERO).await.unwrap(),
            AttestationStatus::NotFound
        );
    }
}
