//! Core type definitions for question routing

use serde::{Deserialize, Serialize};
use std::fmt;

/// Branch the orchestrator actually executes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Route {
    Retrieval,  // plots, themes, roles
    Statistics, // rentals, ratings, release facts
    Both,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Retrieval => "RETRIEVAL",
            Route::Statistics => "STATISTICS",
            Route::Both => "BOTH",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Route used when the classifier answers with something outside the
/// closed label set. Consulting both sources never drops information.
pub const UNRECOGNIZED_DECISION_ROUTE: Route = Route::Both;

/// Parsed classifier output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "raw", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouteDecision {
    Retrieval,
    Statistics,
    Both,
    /// Classifier text that matched no known label (kept verbatim)
    Unknown(String),
}

impl RouteDecision {
    /// Validate raw generated text against the closed label set.
    ///
    /// Whitespace, surrounding quotes and trailing punctuation are stripped
    /// before an upper-cased exact match. `SQL` and `RAG` are accepted as
    /// legacy aliases.
    pub fn parse(raw: &str) -> Self {
        let normalized = raw
            .trim()
            .trim_matches(|c: char| c == '\'' || c == '"' || c == '`' || c == '.')
            .trim()
            .to_uppercase();

        match normalized.as_str() {
            "RETRIEVAL" | "RAG" => RouteDecision::Retrieval,
            "STATISTICS" | "SQL" => RouteDecision::Statistics,
            "BOTH" => RouteDecision::Both,
            _ => RouteDecision::Unknown(raw.trim().to_string()),
        }
    }

    /// Resolve the decision to the branch that will run
    pub fn route(&self) -> Route {
        match self {
            RouteDecision::Retrieval => Route::Retrieval,
            RouteDecision::Statistics => Route::Statistics,
            RouteDecision::Both => Route::Both,
            RouteDecision::Unknown(_) => UNRECOGNIZED_DECISION_ROUTE,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, RouteDecision::Unknown(_))
    }
}

/// Knowledge source a partial answer came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Source {
    Retrieval,
    Statistics,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Retrieval => f.write_str("retrieval"),
            Source::Statistics => f.write_str("statistics"),
        }
    }
}

/// Answer obtained from one knowledge source (possibly degraded to an
/// inline error description)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceAnswer {
    pub source: Source,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_query: Option<String>, // statistics only
}

impl SourceAnswer {
    pub fn retrieval(text: impl Into<String>) -> Self {
        Self {
            source: Source::Retrieval,
            text: text.into(),
            generated_query: None,
        }
    }

    pub fn statistics(text: impl Into<String>, generated_query: Option<String>) -> Self {
        Self {
            source: Source::Statistics,
            text: text.into(),
            generated_query,
        }
    }
}

/// Response from the retrieval service
#[derive(Debug, Clone, Deserialize)]
pub struct RetrievalAnswer {
    pub answer: String,
    /// Present only when the service runs in its expanded mode
    #[serde(default)]
    pub retrieved_movies: Vec<MovieInfo>,
}

/// Ranked movie record returned by the expanded retrieval form
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MovieInfo {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub genres: String,
    #[serde(default)]
    pub plot_summary: String,
    #[serde(default)]
    pub actors: String,
    #[serde(default)]
    pub similarity_score: Option<f64>,
}

/// Response from the statistics service
#[derive(Debug, Clone, Deserialize)]
pub struct StatisticsAnswer {
    #[serde(rename = "sql_query")]
    pub generated_query: String,
    pub answer: String,
}

/// Final outcome of one routed question
#[derive(Debug, Clone, Serialize)]
pub struct OrchestrationResult {
    pub question: String,
    pub response: String,
    /// `None` only when classification itself failed
    pub route_taken: Option<Route>,
    pub decision: Option<RouteDecision>,
    pub sources: Vec<SourceAnswer>,
    pub error: Option<String>,
}

/// Speaker of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One turn of prior conversation supplied by a front end
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exact_labels() {
        assert_eq!(RouteDecision::parse("RETRIEVAL"), RouteDecision::Retrieval);
        assert_eq!(RouteDecision::parse("STATISTICS"), RouteDecision::Statistics);
        assert_eq!(RouteDecision::parse("BOTH"), RouteDecision::Both);
    }

    #[test]
    fn test_parse_normalizes_case_and_whitespace() {
        assert_eq!(RouteDecision::parse("  statistics\n"), RouteDecision::Statistics);
        assert_eq!(RouteDecision::parse("'Both'."), RouteDecision::Both);
        assert_eq!(RouteDecision::parse("sql"), RouteDecision::Statistics);
        assert_eq!(RouteDecision::parse("Rag"), RouteDecision::Retrieval);
    }

    #[test]
    fn test_parse_unknown_keeps_raw_text() {
        let decision = RouteDecision::parse(" I think SQL fits best ");
        assert_eq!(decision, RouteDecision::Unknown("I think SQL fits best".to_string()));
        assert!(decision.is_unknown());
        assert_eq!(decision.route(), Route::Both);
    }

    #[test]
    fn test_route_serializes_upper_case() {
        let json = serde_json::to_string(&Route::Statistics).unwrap();
        assert_eq!(json, "\"STATISTICS\"");
    }

    #[test]
    fn test_statistics_answer_wire_format() {
        let parsed: StatisticsAnswer =
            serde_json::from_str(r#"{"sql_query": "SELECT 1", "answer": "one"}"#).unwrap();
        assert_eq!(parsed.generated_query, "SELECT 1");
        assert_eq!(parsed.answer, "one");
    }

    #[test]
    fn test_retrieval_answer_expanded_form() {
        let parsed: RetrievalAnswer = serde_json::from_str(
            r#"{"answer": "a plot", "retrieved_movies": [{"title": "Primer", "similarity_score": 0.9}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.retrieved_movies.len(), 1);
        assert_eq!(parsed.retrieved_movies[0].title, "Primer");
        assert!(parsed.retrieved_movies[0].year.is_empty());
    }
}
