//! NEAR Staking Advisor HTTP Server
//!
//! Axum-based server exposing the staking advisor as a chat endpoint and a
//! structured per-account recommendation endpoint.

mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::{AgentBuilder, FileSessionStore, LlmProvider};
use agent_runtime::OllamaProvider;
use staking_advisor::{
    AccountDataSource, AdvisorConfig, Clock, MockAccountSource, NearBlocksClient,
    STAKING_ADVISOR_PROMPT, StakingAdvisor, StakingEngine, SystemClock,
};

use crate::handlers::{account_recommendation, chat_handler, health_check};
use crate::state::AppState;

fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/chat", post(chat_handler))
        .route(
            "/api/accounts/{account_id}/recommendation",
            get(account_recommendation),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

/// Connect to Ollama when `LLM_ENABLED` is set
async fn init_provider() -> anyhow::Result<Option<Arc<dyn LlmProvider>>> {
    if !env_flag("LLM_ENABLED") {
        tracing::info!("LLM commentary disabled (set LLM_ENABLED=true to enable)");
        return Ok(None);
    }

    let provider = Arc::new(OllamaProvider::from_env()?);
    match provider.health_check().await {
        Ok(true) => {
            tracing::info!("✓ Connected to Ollama at {}", provider.config().base_url());
            if let Ok(models) = provider.list_models().await {
                for model in models {
                    tracing::info!("  Model: {}", model.id);
                }
            }
        }
        Ok(false) | Err(_) => {
            tracing::warn!("⚠ Ollama not available - reports will omit commentary");
            tracing::warn!("  Make sure Ollama is running: ollama serve");
        }
    }

    let provider: Arc<dyn LlmProvider> = provider;
    Ok(Some(provider))
}

/// `ACCOUNT_SOURCE=mock` serves fixture accounts for offline demos
fn init_source(config: &AdvisorConfig) -> anyhow::Result<Arc<dyn AccountDataSource>> {
    let kind = std::env::var("ACCOUNT_SOURCE").unwrap_or_else(|_| "nearblocks".into());
    let source: Arc<dyn AccountDataSource> = match kind.trim().to_ascii_lowercase().as_str() {
        "mock" => {
            tracing::warn!("Using mock account source (busy.near, quiet.near, idle.near, dust.near)");
            Arc::new(MockAccountSource::demo(SystemClock.now_nanos()))
        }
        "nearblocks" => Arc::new(NearBlocksClient::new(config.clone())?),
        other => anyhow::bail!("Unknown ACCOUNT_SOURCE '{other}' (expected 'nearblocks' or 'mock')"),
    };
    Ok(source)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AdvisorConfig::from_env()?;
    let source = init_source(&config)?;
    tracing::info!(
        source = source.name(),
        nearblocks = %config.nearblocks_api_url,
        transaction_limit = config.transaction_limit,
        "Account source ready"
    );

    let provider = init_provider().await?;

    let mut advisor = StakingAdvisor::new(source, StakingEngine::default(), config);
    if let Some(provider) = &provider {
        let model = std::env::var("LLM_MODEL").unwrap_or_else(|_| "llama3.2".into());
        let agent = AgentBuilder::new()
            .provider(provider.clone())
            .system_prompt(STAKING_ADVISOR_PROMPT)
            .model(model)
            .build()?;
        advisor = advisor.with_agent(agent);
    }

    let state_dir = std::env::var("STATE_DIR").unwrap_or_else(|_| "./state".into());
    let sessions = FileSessionStore::new(&state_dir)?;
    tracing::info!("Sessions stored in {}", sessions.dir().display());

    let state = AppState {
        advisor: Arc::new(advisor),
        sessions: Arc::new(sessions),
        provider,
    };

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 staking advisor running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                                   - Health check");
    tracing::info!("  POST /api/chat                                 - Send message");
    tracing::info!("  GET  /api/accounts/{{account_id}}/recommendation - Structured report");
    tracing::info!("");

    axum::serve(listener, router(state)).await?;

    Ok(())
}
