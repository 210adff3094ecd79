//! Diagnostic tool - Check agent configuration
//!
//! Run with: cargo run --bin diagnose

use std::env;

fn main() {
    println!("🔍 ARENA AGENT DIAGNOSTIC CHECK\n");

    // Load .env
    dotenvy::dotenv().ok();

    println!("═══════════════════════════════════════════════════");
    println!("                  CONFIGURATION                     ");
    println!("═══════════════════════════════════════════════════\n");

    let checks = [
        ("EXECUTION_MODE", "simulation", "What mode are we in?"),
        ("CHAIN_ID", "42161", "Chain the arena is deployed on"),
        ("POLL_INTERVAL_SECS", "60", "Seconds between agent cycles"),
        ("ENTRY_SCORE_THRESHOLD", "60", "Score above which a battle is flagged for entry"),
        ("LOG_BUFFER_SIZE", "500", "Log entries kept for the dashboard"),
        ("HTTP_PORT", "3001", "Dashboard API port"),
        ("EMERGENCY_STOP", "false", "Block all submissions?"),
    ];

    for (key, default, desc) in checks {
        let value = env::var(key).unwrap_or_else(|_| default.to_string());
        let marker = if env::var(key).is_err() { "(default)" } else { "(from .env)" };
        println!("  {}: {} {}", key, value, marker);
        println!("    └─ {}\n", desc);
    }

    let rpc = env::var("RPC_URL").unwrap_or_else(|_| "NOT SET".to_string());
    println!("  RPC_URL: {}", shorten(&rpc));

    println!("\n═══════════════════════════════════════════════════");
    println!("                    CONTRACTS                       ");
    println!("═══════════════════════════════════════════════════\n");

    let set = |key: &str| env::var(key).map(|v| !v.trim().is_empty()).unwrap_or(false);
    let arena = set("BATTLE_ARENA_ADDRESS");

    println!("  BATTLE_ARENA_ADDRESS:  {}", if arena { "✅ Set" } else { "❌ Not set" });
    println!("  POOL_MANAGER_ADDRESS:  {}", if set("POOL_MANAGER_ADDRESS") { "✅ Set" } else { "⚪ Not set (no pool state)" });
    println!("  LEADERBOARD_ADDRESS:   {}", if set("LEADERBOARD_ADDRESS") { "✅ Set" } else { "⚪ Not set (no ELO)" });

    let vaults = env::var("VAULT_ADDRESSES")
        .map(|v| v.split(',').filter(|s| !s.trim().is_empty()).count())
        .unwrap_or(0);
    println!("  VAULT_ADDRESSES:       {} configured", vaults);

    println!("\n═══════════════════════════════════════════════════");
    println!("                    ROUTING                         ");
    println!("═══════════════════════════════════════════════════\n");

    println!("  LIFI_API_KEY:          {}", if set("LIFI_API_KEY") { "✅ Set" } else { "⚪ Not set (public rate limits)" });
    let route_keys = ["ROUTE_FROM_CHAIN", "ROUTE_TO_CHAIN", "ROUTE_FROM_TOKEN", "ROUTE_TO_TOKEN", "ROUTE_AMOUNT"];
    let route_set = route_keys.iter().filter(|k| set(**k)).count();
    match route_set {
        0 => println!("  Route check:           ⚪ Disabled"),
        n if n == route_keys.len() => println!("  Route check:           ✅ Enabled"),
        n => println!("  Route check:           ⚠️  Partially configured ({}/{})", n, route_keys.len()),
    }

    let mode = env::var("EXECUTION_MODE").unwrap_or_else(|_| "simulation".to_string());
    let key = set("AGENT_PRIVATE_KEY");

    println!("\n═══════════════════════════════════════════════════");
    println!("                     STATUS                         ");
    println!("═══════════════════════════════════════════════════\n");

    match mode.to_lowercase().as_str() {
        "simulation" => {
            println!("  📋 SIMULATION MODE");
            println!("     → Agent finds expired battles but does NOT settle");
            println!("     → Transactions: NONE");
        }
        "dry_run" | "dryrun" => {
            println!("  🔬 DRY RUN MODE");
            println!("     → Agent simulates settleBattle with eth_call");
            println!("     → Transactions: NONE");
        }
        "production" => {
            println!("  🚀 PRODUCTION MODE");
            println!("     → Agent WILL submit settleBattle transactions!");
            println!("     → Gas is paid by the agent wallet");

            if !key || !arena {
                println!("\n  ⚠️  WARNING: Production mode but missing required settings!");
                println!("     The agent will refuse to start until configured.");
            }
        }
        _ => {
            println!("  ❓ Unknown mode: {} (treated as simulation)", mode);
        }
    }

    if !arena {
        println!("\n  ⚠️  BATTLE_ARENA_ADDRESS is required for every arena command.");
    }

    println!("\n✅ Diagnostic complete!\n");
}

/// Keep the first 30 and last 15 chars of values longer than 50
/// (RPC URLs often embed API keys)
fn shorten(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 50 {
        return value.to_string();
    }
    let head: String = chars[..30].iter().collect();
    let tail: String = chars[chars.len() - 15..].iter().collect();
    format!("{}...{}", head, tail)
}
