//! Text generator backed by an OpenAI-compatible chat completions API

use crate::backends::TextGenerator;
use crate::config::LlmSettings;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Request to the chat completions endpoint
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<CompletionMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct CompletionMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// Response from the chat completions endpoint
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// HTTP-based text generator
pub struct HttpTextGen {
    settings: LlmSettings,
    client: reqwest::Client,
}

impl HttpTextGen {
    pub fn new(settings: LlmSettings, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build text generation HTTP client")?;

        Ok(Self { settings, client })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.settings.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl TextGenerator for HttpTextGen {
    fn name(&self) -> &'static str {
        "http_chat_completions"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = CompletionRequest {
            model: &self.settings.model,
            temperature: self.settings.temperature,
            messages: vec![CompletionMessage {
                role: "user",
                content: prompt,
            }],
        };

        let mut builder = self.client.post(self.completions_url()).json(&request);
        if let Some(ref key) = self.settings.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .context("Failed to call text generation service")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Text generation error ({}): {}", status, error_text);
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .context("Failed to parse text generation response")?;

        let text = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .context("Text generation response had no message content")?;

        tracing::debug!("Generated {} chars with model {}", text.len(), self.settings.model);

        Ok(text)
    }
}
