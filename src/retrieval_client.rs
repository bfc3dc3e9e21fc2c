//! HTTP client for the semantic retrieval (RAG) service

use crate::backends::RetrievalBackend;
use crate::types::RetrievalAnswer;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Request body expected by the retrieval service
#[derive(Debug, Serialize)]
struct RetrievalRequest<'a> {
    text: &'a str,
    k: usize,
}

#[derive(Debug, Clone)]
pub struct RetrievalClient {
    endpoint: String,
    top_k: usize,
    client: reqwest::Client,
}

impl RetrievalClient {
    /// Create a client posting to `endpoint` (e.g. `http://localhost:8000/rag`)
    pub fn new(endpoint: impl Into<String>, top_k: usize, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build retrieval HTTP client")?;

        Ok(Self {
            endpoint: endpoint.into(),
            top_k,
            client,
        })
    }

    /// Service root, used for the health probe
    fn base_url(&self) -> &str {
        match self.endpoint.rfind('/') {
            Some(idx) if idx > "https://".len() => &self.endpoint[..idx],
            _ => &self.endpoint,
        }
    }

    /// Health check
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/health", self.base_url());
        let response = self.client.get(&url).send().await?;
        Ok(response.status().is_success())
    }
}

#[async_trait]
impl RetrievalBackend for RetrievalClient {
    fn name(&self) -> &'static str {
        "http_retrieval"
    }

    async fn retrieve(&self, question: &str) -> Result<RetrievalAnswer> {
        debug!("Querying retrieval service at {} (k={})", self.endpoint, self.top_k);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&RetrievalRequest {
                text: question,
                k: self.top_k,
            })
            .send()
            .await
            .context("Failed to call retrieval service")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Retrieval service error ({}): {}", status, body);
        }

        let answer: RetrievalAnswer = response
            .json()
            .await
            .context("Failed to parse retrieval service response")?;

        debug!(
            "Retrieval answer: {} chars, {} ranked movies",
            answer.answer.len(),
            answer.retrieved_movies.len()
        );

        Ok(answer)
    }
}
