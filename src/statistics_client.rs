//! HTTP client for the natural-language-to-SQL statistics service

use crate::backends::StatisticsBackend;
use crate::types::StatisticsAnswer;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize)]
struct StatisticsRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Clone)]
pub struct StatisticsClient {
    endpoint: String,
    client: reqwest::Client,
}

impl StatisticsClient {
    /// Create a client posting to `endpoint` (e.g. `http://localhost:8001/sql`)
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build statistics HTTP client")?;

        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }
}

#[async_trait]
impl StatisticsBackend for StatisticsClient {
    fn name(&self) -> &'static str {
        "http_statistics"
    }

    async fn query_stats(&self, question: &str) -> Result<StatisticsAnswer> {
        debug!("Querying statistics service at {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&StatisticsRequest { text: question })
            .send()
            .await
            .context("Failed to call statistics service")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Statistics service error ({}): {}", status, body);
        }

        let answer: StatisticsAnswer = response
            .json()
            .await
            .context("Failed to parse statistics service response")?;

        debug!("Statistics service generated query: {}", answer.generated_query);

        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_query_stats_parses_query_and_answer() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/sql"))
            .and(body_json(serde_json::json!({"text": "most rented comedies"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "sql_query": "SELECT title FROM film LIMIT 5",
                "answer": "Movie A, Movie B"
            })))
            .mount(&server)
            .await;

        let client = StatisticsClient::new(format!("{}/sql", server.uri()), Duration::from_secs(5)).unwrap();
        let answer = client.query_stats("most rented comedies").await.unwrap();
        assert_eq!(answer.generated_query, "SELECT title FROM film LIMIT 5");
        assert_eq!(answer.answer, "Movie A, Movie B");
    }

    #[tokio::test]
    async fn test_query_stats_missing_sql_query_is_malformed() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"answer": "no query"})))
            .mount(&server)
            .await;

        let client = StatisticsClient::new(format!("{}/sql", server.uri()), Duration::from_secs(5)).unwrap();
        assert!(client.query_stats("q").await.is_err());
    }

    #[tokio::test]
    async fn test_query_stats_unreachable() {
        // Nothing listens on the discard port
        let client = StatisticsClient::new("http://127.0.0.1:9/sql", Duration::from_secs(2)).unwrap();
        let err = client.query_stats("q").await.unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to call statistics service"));
    }
}
