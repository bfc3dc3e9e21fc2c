//! Pluggable backends the orchestrator talks to

use crate::types::*;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Semantic-similarity retrieval over plot/theme/role content
#[async_trait]
pub trait RetrievalBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn retrieve(&self, question: &str) -> Result<RetrievalAnswer>;
}

/// Natural-language-to-query translation over rental statistics
#[async_trait]
pub trait StatisticsBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn query_stats(&self, question: &str) -> Result<StatisticsAnswer>;
}

/// Prompt in, generated text out
#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn name(&self) -> &'static str;

    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Mock retrieval backend for testing and offline runs
pub struct MockRetrievalBackend {
    answer: std::result::Result<String, String>,
    calls: AtomicUsize,
}

impl MockRetrievalBackend {
    pub fn answering(answer: impl Into<String>) -> Self {
        Self {
            answer: Ok(answer.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            answer: Err(message.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RetrievalBackend for MockRetrievalBackend {
    fn name(&self) -> &'static str {
        "mock_retrieval"
    }

    async fn retrieve(&self, _question: &str) -> Result<RetrievalAnswer> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.answer {
            Ok(answer) => Ok(RetrievalAnswer {
                answer: answer.clone(),
                retrieved_movies: vec![],
            }),
            Err(message) => anyhow::bail!("{}", message),
        }
    }
}

/// Mock statistics backend for testing and offline runs
pub struct MockStatisticsBackend {
    answer: std::result::Result<(String, String), String>,
    calls: AtomicUsize,
}

impl MockStatisticsBackend {
    pub fn answering(generated_query: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            answer: Ok((generated_query.into(), answer.into())),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            answer: Err(message.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatisticsBackend for MockStatisticsBackend {
    fn name(&self) -> &'static str {
        "mock_statistics"
    }

    async fn query_stats(&self, _question: &str) -> Result<StatisticsAnswer> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.answer {
            Ok((query, answer)) => Ok(StatisticsAnswer {
                generated_query: query.clone(),
                answer: answer.clone(),
            }),
            Err(message) => anyhow::bail!("{}", message),
        }
    }
}

type Responder = Box<dyn Fn(&str) -> Result<String> + Send + Sync>;

/// Scripted text generator; records every prompt it receives
pub struct MockTextGenerator {
    responder: Responder,
    prompts: Mutex<Vec<String>>,
}

impl MockTextGenerator {
    /// Always answer with the same text
    pub fn fixed(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::from_fn(move |_| Ok(text.clone()))
    }

    /// Always fail with the given message
    pub fn failing(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::from_fn(move |_| anyhow::bail!("{}", message))
    }

    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&str) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(f),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    fn name(&self) -> &'static str {
        "mock_text"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        (self.responder)(prompt)
    }
}
