//! Dashboard API
//!
//! JSON over HTTP for the frontend. Every 256-bit integer is a decimal
//! string. Reads come from the agent context; `/battles/:id` and `/vaults`
//! go to the chain; `/trigger` runs one cycle and returns its summary.
//! `DELETE` on `/logs` and `/transactions` clears them.

use alloy_primitives::U256;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use eyre::{Result, WrapErr};
use serde_json::json;
use std::str::FromStr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::agent::Agent;
use crate::arena::BattleNotFound;

type AppState = Arc<Agent>;

/// Error body: `{"error": "..."}`
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

pub fn router(agent: Arc<Agent>) -> Router {
    // Frontend is served from a different origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/vaults", get(vaults))
        .route("/logs", get(logs).delete(clear_logs))
        .route("/decisions", get(decisions))
        .route("/routes", get(routes))
        .route("/transactions", get(transactions).delete(clear_transactions))
        .route("/battles/:id", get(battle))
        .route("/trigger", post(trigger))
        .with_state(agent)
        .layer(cors)
}

/// Bind and serve until the listener fails
pub async fn serve(agent: Arc<Agent>, port: u16) -> Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .wrap_err_with(|| format!("Failed to bind {}", addr))?;

    info!("🌐 Dashboard API listening on http://{}", addr);
    axum::serve(listener, router(agent))
        .await
        .wrap_err("Dashboard server error")
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
    }))
}

async fn status(State(agent): State<AppState>) -> impl IntoResponse {
    Json(agent.status().await)
}

async fn vaults(State(agent): State<AppState>) -> impl IntoResponse {
    Json(agent.vault_summaries().await)
}

async fn logs(State(agent): State<AppState>) -> impl IntoResponse {
    Json(agent.context().logs().await)
}

async fn clear_logs(State(agent): State<AppState>) -> impl IntoResponse {
    let cleared = agent.context().clear_logs().await;
    Json(json!({ "cleared": cleared }))
}

async fn decisions(State(agent): State<AppState>) -> impl IntoResponse {
    Json(agent.context().decisions().await)
}

async fn routes(State(agent): State<AppState>) -> impl IntoResponse {
    Json(agent.context().routes().await)
}

async fn transactions(State(agent): State<AppState>) -> impl IntoResponse {
    Json(agent.context().transactions().await)
}

async fn clear_transactions(State(agent): State<AppState>) -> impl IntoResponse {
    let cleared = agent.context().clear_transactions().await;
    Json(json!({ "cleared": cleared }))
}

async fn battle(
    State(agent): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = U256::from_str(&id)
        .map_err(|_| ApiError::new(StatusCode::BAD_REQUEST, format!("Invalid battle id: {}", id)))?;

    let analysis = agent.analyze(id).await.map_err(|e| {
        let status = if e.downcast_ref::<BattleNotFound>().is_some() {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::BAD_GATEWAY
        };
        ApiError::new(status, format!("{:#}", e))
    })?;
    Ok(Json(analysis))
}

async fn trigger(State(agent): State<AppState>) -> impl IntoResponse {
    info!("Manual cycle triggered");
    Json(agent.run_cycle().await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::mock::{battle as battle_fixture, MockArena};
    use crate::arena::BattleStatus;
    use crate::config::Config;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use tower::ServiceExt;

    fn app() -> (Arc<Agent>, Router) {
        let mut arena = MockArena::new()
            .with_battle(battle_fixture(1, BattleStatus::Active))
            .with_battle(battle_fixture(2, BattleStatus::Pending));
        arena.expired.push(U256::from(1u64));
        arena.broken.insert(U256::from(500u64));

        let agent = Arc::new(Agent::new(Config::default(), Arc::new(arena)).unwrap());
        (agent.clone(), router(agent))
    }

    async fn call(app: Router, method: Method, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_health() {
        let (_, app) = app();
        let (status, body) = call(app, Method::GET, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_battle_uses_decimal_strings() {
        let (_, app) = app();
        let (status, body) = call(app, Method::GET, "/battles/1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["battle"]["id"], "1");
        assert_eq!(body["battle"]["total_fees"], "1000000");
        assert_eq!(body["resolver_reward"], "10000");
        assert_eq!(body["is_expired"], true);
    }

    #[tokio::test]
    async fn test_battle_errors() {
        let (_, app) = app();
        let (status, body) = call(app.clone(), Method::GET, "/battles/banana").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("banana"));

        let (status, body) = call(app.clone(), Method::GET, "/battles/404").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Battle 404 does not exist");

        // A read that fails is not a missing battle
        let (status, body) = call(app, Method::GET, "/battles/500").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"].as_str().unwrap().contains("getBattle(500) reverted"));
    }

    #[tokio::test]
    async fn test_trigger_then_read_results() {
        let (_, app) = app();
        let (status, summary) = call(app.clone(), Method::POST, "/trigger").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["settled"], 1);

        let (_, decisions) = call(app.clone(), Method::GET, "/decisions").await;
        assert_eq!(decisions.as_array().map(Vec::len), Some(2));
        assert_eq!(decisions[0]["battle_id"], "1");

        let (_, txs) = call(app.clone(), Method::GET, "/transactions").await;
        assert_eq!(txs[0]["battle_id"], "1");
        assert_eq!(txs[0]["mode"], "Simulation");

        let (status, body) = call(app.clone(), Method::DELETE, "/transactions").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cleared"], 1);
        let (_, txs) = call(app.clone(), Method::GET, "/transactions").await;
        assert_eq!(txs, serde_json::json!([]));

        let (_, routes) = call(app, Method::GET, "/routes").await;
        assert_eq!(routes, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_logs_can_be_cleared() {
        let (agent, app) = app();
        agent.context().info("hello").await;

        let (_, logs) = call(app.clone(), Method::GET, "/logs").await;
        assert_eq!(logs[0]["message"], "hello");
        assert_eq!(logs[0]["level"], "info");

        let (status, body) = call(app.clone(), Method::DELETE, "/logs").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cleared"], 1);

        let (_, logs) = call(app, Method::GET, "/logs").await;
        assert_eq!(logs, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_status_and_vaults() {
        let (_, app) = app();
        let (_, status) = call(app.clone(), Method::GET, "/status").await;
        assert_eq!(status["mode"], "Simulation");
        assert_eq!(status["block_number"], 19_000_000);

        let (_, vaults) = call(app, Method::GET, "/vaults").await;
        assert_eq!(vaults, serde_json::json!([]));
    }
}
