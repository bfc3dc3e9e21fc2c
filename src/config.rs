//! Runtime settings read from the environment

use anyhow::{Context, Result};
use std::str::FromStr;
use std::time::Duration;

/// What to answer when the fusion step fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FusionFallback {
    /// Report the failure text as the response
    #[default]
    ErrorMessage,
    /// Return both raw source answers under labeled headings
    Concatenate,
}

impl FromStr for FusionFallback {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "error" | "error_message" => Ok(FusionFallback::ErrorMessage),
            "concatenate" | "concat" => Ok(FusionFallback::Concatenate),
            other => anyhow::bail!("unknown fusion fallback '{}' (expected 'error' or 'concatenate')", other),
        }
    }
}

/// Endpoint and model settings for the text-generation service
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            api_key: None,
            temperature: 0.0,
        }
    }
}

/// Orchestrator behavior that does not depend on which backends are wired in
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub max_fused_chars: usize,
    pub fusion_fallback: FusionFallback,
    pub context_window: usize, // prior turns prepended to a question
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            max_fused_chars: 8000,
            fusion_fallback: FusionFallback::ErrorMessage,
            context_window: 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub retrieval_url: String,
    pub statistics_url: String,
    pub retrieval_top_k: usize,
    pub downstream_timeout: Duration,
    pub llm: LlmSettings,
    pub orchestrator: OrchestratorSettings,
    pub port: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            retrieval_url: "http://localhost:8000/rag".to_string(),
            statistics_url: "http://localhost:8001/sql".to_string(),
            retrieval_top_k: 5,
            downstream_timeout: Duration::from_secs(60),
            llm: LlmSettings::default(),
            orchestrator: OrchestratorSettings::default(),
            port: 8081,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();

        let timeout_secs: u64 = parse_or(&lookup, "DOWNSTREAM_TIMEOUT_SECS", defaults.downstream_timeout.as_secs())?;

        Ok(Self {
            retrieval_url: lookup("RETRIEVAL_SERVICE_URL").unwrap_or(defaults.retrieval_url),
            statistics_url: lookup("STATISTICS_SERVICE_URL").unwrap_or(defaults.statistics_url),
            retrieval_top_k: parse_or(&lookup, "RETRIEVAL_TOP_K", defaults.retrieval_top_k)?,
            downstream_timeout: Duration::from_secs(timeout_secs),
            llm: LlmSettings {
                base_url: lookup("LLM_BASE_URL").unwrap_or(defaults.llm.base_url),
                model: lookup("LLM_MODEL").unwrap_or(defaults.llm.model),
                api_key: lookup("OPENAI_API_KEY").filter(|k| !k.trim().is_empty()),
                temperature: parse_or(&lookup, "LLM_TEMPERATURE", defaults.llm.temperature)?,
            },
            orchestrator: OrchestratorSettings {
                max_fused_chars: parse_or(&lookup, "MAX_FUSED_CHARS", defaults.orchestrator.max_fused_chars)?,
                fusion_fallback: parse_or(&lookup, "FUSION_FALLBACK", defaults.orchestrator.fusion_fallback)?,
                context_window: parse_or(&lookup, "CONTEXT_WINDOW", defaults.orchestrator.context_window)?,
            },
            port: parse_or(&lookup, "MOVIEROUTE_PORT", defaults.port)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("Invalid value for {}: '{}'", key, raw)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let settings = Settings::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(settings.retrieval_url, "http://localhost:8000/rag");
        assert_eq!(settings.statistics_url, "http://localhost:8001/sql");
        assert_eq!(settings.retrieval_top_k, 5);
        assert_eq!(settings.llm.temperature, 0.0);
        assert!(settings.llm.api_key.is_none());
        assert_eq!(settings.orchestrator.fusion_fallback, FusionFallback::ErrorMessage);
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("RETRIEVAL_TOP_K", "10"),
            ("FUSION_FALLBACK", "concatenate"),
            ("DOWNSTREAM_TIMEOUT_SECS", "5"),
            ("OPENAI_API_KEY", "sk-test"),
        ]))
        .unwrap();
        assert_eq!(settings.retrieval_top_k, 10);
        assert_eq!(settings.orchestrator.fusion_fallback, FusionFallback::Concatenate);
        assert_eq!(settings.downstream_timeout, Duration::from_secs(5));
        assert_eq!(settings.llm.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_invalid_number_is_reported() {
        let err = Settings::from_lookup(lookup_from(&[("RETRIEVAL_TOP_K", "many")])).unwrap_err();
        assert!(err.to_string().contains("RETRIEVAL_TOP_K"));
    }
}
