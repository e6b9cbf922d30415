//! HTTP API: the agent endpoint and health check.

mod agent;
mod types;

pub use types::{AgentRequest, ErrorResponse, HealthResponse, IncomingMessage};

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::agent::Agent;
use crate::config::Config;
use crate::knowledge::HttpKnowledgeBase;
use crate::llm::OpenRouterClient;
use crate::tools::{
    AnalyzeText, Calculate, RegistryError, SearchKnowledgeBase, SearchWeb, SerperClient,
    ToolRegistry,
};

/// Shared state for all requests. The agent (and the registry inside it) is
/// read-only once built; per-request orchestration state never lives here.
pub struct AppState {
    pub agent: Arc<Agent>,
}

/// Build the process-wide tool registry.
///
/// Duplicate tool names surface here as a startup error, before the server
/// accepts any request.
pub fn build_registry(config: &Config) -> Result<ToolRegistry, RegistryError> {
    let kb = Arc::new(HttpKnowledgeBase::new(config.knowledge.clone()));
    ToolRegistry::build(vec![
        Box::new(SearchKnowledgeBase::new(kb)),
        Box::new(Calculate),
        Box::new(AnalyzeText),
        Box::new(SearchWeb::new(SerperClient::new(
            config.serper_api_key.clone(),
        ))),
    ])
}

/// Start the HTTP server and block until it exits.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let registry = Arc::new(build_registry(&config)?);
    tracing::info!(
        tools = ?registry.list_tools().iter().map(|t| t.name.clone()).collect::<Vec<_>>(),
        "tool registry built"
    );

    let llm = Arc::new(OpenRouterClient::new(config.api_key.clone()));
    let agent = Arc::new(Agent::new(llm, registry, &config));
    let state = Arc::new(AppState { agent });

    let app = Router::new()
        .route("/health", get(health))
        .route("/api/agent", post(agent::respond))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_builds_with_default_config() {
        let config = Config::new("key".to_string(), "model".to_string());
        let registry = build_registry(&config).unwrap();

        let names: Vec<String> = registry.list_tools().into_iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            vec![
                "search_knowledge_base",
                "calculate",
                "analyze_text",
                "search_web"
            ]
        );
    }
}
