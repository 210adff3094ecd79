//! Deployment Check Utility
//!
//! Run with: cargo run --bin deploy-check
//!
//! Verifies the agent can reach the chain, the arena contracts are deployed
//! and the settlement key is usable before production mode is enabled.

use alloy_primitives::Address;
use std::env;
use std::str::FromStr;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    println!();
    println!("╔════════════════════════════════════════════════════════════╗");
    println!("║          ARENA AGENT DEPLOYMENT CHECK                      ║");
    println!("╚════════════════════════════════════════════════════════════╝");
    println!();

    let mut issues: Vec<String> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    // ==========================================
    // CHECK 1: RPC URL
    // ==========================================
    println!("📡 CHECKING RPC CONNECTION...");

    let rpc_url = env::var("RPC_URL").unwrap_or_default();
    let rpc_ok = !rpc_url.is_empty() && !rpc_url.contains("YOUR_API_KEY");
    if !rpc_ok {
        issues.push("RPC_URL not configured".to_string());
        println!("   ❌ RPC_URL: Not configured");
    } else {
        match check_rpc(&rpc_url).await {
            Ok((block, chain_id)) => {
                println!("   ✅ RPC connected, block {} on chain {}", block, chain_id);
                if let Some(expected) = env::var("CHAIN_ID").ok().and_then(|s| s.parse::<u64>().ok()) {
                    if expected != chain_id {
                        issues.push(format!("CHAIN_ID={} but RPC reports {}", expected, chain_id));
                        println!("   ❌ CHAIN_ID mismatch: configured {}, RPC {}", expected, chain_id);
                    }
                }
            }
            Err(e) => {
                issues.push(format!("RPC connection failed: {}", e));
                println!("   ❌ RPC connection failed: {}", e);
            }
        }
    }
    println!();

    // ==========================================
    // CHECK 2: Contracts
    // ==========================================
    println!("📜 CHECKING CONTRACTS...");

    let contracts = [
        ("BATTLE_ARENA_ADDRESS", true),
        ("POOL_MANAGER_ADDRESS", false),
        ("LEADERBOARD_ADDRESS", false),
    ];

    for (key, required) in contracts {
        let raw = env::var(key).unwrap_or_default();
        if raw.is_empty() {
            if required {
                issues.push(format!("{} not set", key));
                println!("   ❌ {}: Not configured", key);
            } else {
                warnings.push(format!("{} not set", key));
                println!("   ⚠️  {}: Not configured (related fields stay empty)", key);
            }
            continue;
        }

        let addr = match Address::from_str(raw.trim()) {
            Ok(addr) => addr,
            Err(_) => {
                issues.push(format!("{} invalid format", key));
                println!("   ❌ {}: Invalid address format", key);
                continue;
            }
        };

        if !rpc_ok {
            println!("   ⚠️  {}: {:?} (cannot verify without RPC)", key, addr);
            continue;
        }

        match check_contract(&rpc_url, addr).await {
            Ok(true) => println!("   ✅ {}: {:?} (code exists)", key, addr),
            Ok(false) => {
                issues.push(format!("{} has no code", key));
                println!("   ❌ {}: {:?} (NO CODE - wrong network?)", key, addr);
            }
            Err(e) => {
                warnings.push(format!("Could not verify {}: {}", key, e));
                println!("   ⚠️  {}: {:?} (verification failed)", key, addr);
            }
        }
    }
    println!();

    // ==========================================
    // CHECK 3: Agent Key
    // ==========================================
    println!("🔐 CHECKING AGENT KEY...");

    let mode = env::var("EXECUTION_MODE").unwrap_or_else(|_| "simulation".to_string());
    let production = mode.eq_ignore_ascii_case("production");

    let agent_key = env::var("AGENT_PRIVATE_KEY").unwrap_or_default();
    if agent_key.is_empty() {
        if production {
            issues.push("AGENT_PRIVATE_KEY not set".to_string());
            println!("   ❌ AGENT_PRIVATE_KEY: Required in production");
        } else {
            println!("   ℹ️  AGENT_PRIVATE_KEY: Not set (read-only agent)");
        }
    } else {
        let key = agent_key.trim().trim_start_matches("0x");
        if key.len() != 64 {
            issues.push("AGENT_PRIVATE_KEY invalid format".to_string());
            println!("   ❌ AGENT_PRIVATE_KEY: Invalid format (should be 64 hex chars)");
        } else {
            match alloy_signer_local::PrivateKeySigner::from_str(key) {
                Ok(signer) => {
                    let address = signer.address();
                    println!("   ✅ AGENT_PRIVATE_KEY: {:?}", address);
                    if rpc_ok {
                        match check_balance(&rpc_url, address).await {
                            Ok(0) => {
                                warnings.push("Agent wallet has no gas".to_string());
                                println!("   ⚠️  Balance: 0 wei (settlements will fail)");
                            }
                            Ok(wei) => println!("   ✅ Balance: {:.6} ETH", wei as f64 / 1e18),
                            Err(e) => println!("   ⚠️  Balance: unknown ({})", e),
                        }
                    }
                }
                Err(_) => {
                    issues.push("AGENT_PRIVATE_KEY parse error".to_string());
                    println!("   ❌ AGENT_PRIVATE_KEY: Not a valid secp256k1 key");
                }
            }
        }
    }
    println!();

    // ==========================================
    // CHECK 4: Execution Mode
    // ==========================================
    println!("🎮 CHECKING EXECUTION MODE...");

    match mode.to_lowercase().as_str() {
        "simulation" => println!("   ℹ️  Mode: SIMULATION (no transactions)"),
        "dry_run" | "dryrun" => println!("   ℹ️  Mode: DRY_RUN (eth_call only)"),
        "production" => {
            println!("   ⚠️  Mode: PRODUCTION (REAL TRANSACTIONS!)");
            if !issues.is_empty() {
                issues.push("Production mode with unresolved issues".to_string());
            }
        }
        _ => {
            warnings.push(format!("Unknown mode: {}", mode));
            println!("   ⚠️  Mode: Unknown ({}), defaulting to simulation", mode);
        }
    }

    if env::var("EMERGENCY_STOP").map(|v| v == "true").unwrap_or(false) {
        warnings.push("EMERGENCY_STOP is active".to_string());
        println!("   🛑 EMERGENCY_STOP is active, nothing will be submitted");
    }
    println!();

    // ==========================================
    // SUMMARY
    // ==========================================
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();

    if issues.is_empty() && warnings.is_empty() {
        println!("✅ ALL CHECKS PASSED!");
        println!();
        println!("   Set EXECUTION_MODE=production when ready.");
    } else if issues.is_empty() {
        println!("⚠️  READY WITH WARNINGS ({} warnings)", warnings.len());
        println!();
        for w in &warnings {
            println!("   • {}", w);
        }
    } else {
        println!("❌ NOT READY ({} issues, {} warnings)", issues.len(), warnings.len());
        println!();
        println!("   MUST FIX:");
        for i in &issues {
            println!("   • {}", i);
        }
        if !warnings.is_empty() {
            println!();
            println!("   WARNINGS:");
            for w in &warnings {
                println!("   • {}", w);
            }
        }
    }

    println!();
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();

    if !issues.is_empty() {
        std::process::exit(1);
    }
}

async fn check_rpc(url: &str) -> Result<(u64, u64), String> {
    use alloy_provider::{Provider, ProviderBuilder};

    let provider = ProviderBuilder::new()
        .connect_http(url.parse().map_err(|e| format!("Invalid URL: {}", e))?);

    let block = provider
        .get_block_number()
        .await
        .map_err(|e| format!("Connection failed: {}", e))?;
    let chain_id = provider
        .get_chain_id()
        .await
        .map_err(|e| format!("eth_chainId failed: {}", e))?;
    Ok((block, chain_id))
}

async fn check_contract(url: &str, address: Address) -> Result<bool, String> {
    use alloy_provider::{Provider, ProviderBuilder};

    let provider = ProviderBuilder::new()
        .connect_http(url.parse().map_err(|e| format!("Invalid URL: {}", e))?);

    let code = provider
        .get_code_at(address)
        .await
        .map_err(|e| format!("Failed to get code: {}", e))?;

    Ok(!code.is_empty())
}

async fn check_balance(url: &str, address: Address) -> Result<u128, String> {
    use alloy_provider::{Provider, ProviderBuilder};

    let provider = ProviderBuilder::new()
        .connect_http(url.parse().map_err(|e| format!("Invalid URL: {}", e))?);

    let balance = provider
        .get_balance(address)
        .await
        .map_err(|e| format!("Failed to get balance: {}", e))?;

    Ok(u128::try_from(balance).unwrap_or(u128::MAX))
}
