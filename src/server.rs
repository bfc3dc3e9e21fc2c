//! HTTP server exposing question routing

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{ChatMessage, OrchestrationResult, SharedOrchestrator};

/// Ask request body
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: Option<String>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Route a question handler
async fn ask_handler(
    State(orchestrator): State<SharedOrchestrator>,
    Json(req): Json<AskRequest>,
) -> Result<Json<OrchestrationResult>, (StatusCode, Json<ErrorResponse>)> {
    if req.question.trim().is_empty() {
        warn!("Rejected ask request with empty question");
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Empty question".to_string(),
                details: Some("`question` must contain non-whitespace text".to_string()),
            }),
        ));
    }

    info!("Received ask request: question='{}', history={} turns", req.question, req.history.len());

    let result = if req.history.is_empty() {
        orchestrator.process_question(&req.question).await
    } else {
        orchestrator
            .process_question_with_history(&req.question, &req.history)
            .await
    };

    Ok(Json(result))
}

/// Health check handler
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "movieroute".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Create and configure the HTTP router
pub fn create_router(orchestrator: SharedOrchestrator) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/ask", post(ask_handler))
        .with_state(orchestrator)
}

/// Serve on an already bound listener
pub async fn serve(listener: tokio::net::TcpListener, orchestrator: SharedOrchestrator) -> anyhow::Result<()> {
    info!("Server listening on {}", listener.local_addr()?);
    axum::serve(listener, create_router(orchestrator)).await?;
    Ok(())
}

/// Run the HTTP server
pub async fn run_server(orchestrator: SharedOrchestrator, port: u16) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    info!("Starting movieroute server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    serve(listener, orchestrator).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OrchestratorSettings;
    use crate::{MockRetrievalBackend, MockStatisticsBackend, MockTextGenerator, Orchestrator};
    use std::sync::Arc;

    async fn spawn_server() -> String {
        let orchestrator = Orchestrator::new(
            Arc::new(MockRetrievalBackend::answering("Primer is about time travel.")),
            Arc::new(MockStatisticsBackend::answering("SELECT 1", "42 rentals")),
            Arc::new(MockTextGenerator::fixed("STATISTICS")),
            OrchestratorSettings::default(),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(serve(listener, orchestrator));
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_ask_returns_orchestration_result() {
        let base = spawn_server().await;

        let body: serde_json::Value = reqwest::Client::new()
            .post(format!("{}/ask", base))
            .json(&serde_json::json!({"question": "How many rentals?"}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body["route_taken"], "STATISTICS");
        assert_eq!(body["response"], "Generated query: SELECT 1\nAnswer: 42 rentals");
        assert!(body["error"].is_null());
    }

    #[tokio::test]
    async fn test_ask_accepts_history() {
        let base = spawn_server().await;

        let response = reqwest::Client::new()
            .post(format!("{}/ask", base))
            .json(&serde_json::json!({
                "question": "and last year?",
                "history": [
                    {"role": "user", "content": "How many rentals?"},
                    {"role": "assistant", "content": "42 rentals"}
                ]
            }))
            .send()
            .await
            .unwrap();

        assert!(response.status().is_success());
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["question"], "and last year?");
    }

    #[tokio::test]
    async fn test_empty_question_rejected() {
        let base = spawn_server().await;

        let response = reqwest::Client::new()
            .post(format!("{}/ask", base))
            .json(&serde_json::json!({"question": "   "}))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health() {
        let base = spawn_server().await;

        let body: serde_json::Value = reqwest::get(format!("{}/health", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "movieroute");
    }
}
