//! Decides which knowledge source(s) a question needs

use crate::backends::TextGenerator;
use crate::error::RouteError;
use crate::types::RouteDecision;
use std::sync::Arc;
use tracing::{debug, warn};

/// Markers around the question inside the routing prompt
pub const QUESTION_OPEN: &str = "<<<";
pub const QUESTION_CLOSE: &str = ">>>";

const ROUTING_INSTRUCTIONS: &str = "\
We have two different movie knowledge sources:

1. STATISTICS (relational rental database): basic movie information and rental data
   - Basic info: title, release year, rating, language, duration
   - Rental data: rental counts, inventory, popularity metrics
   - Example questions:
     - \"When was X released?\"
     - \"What's the rating of X?\"
     - \"most rented movies\"
     - \"rental counts\"
     - \"popular genres\"

2. RETRIEVAL (movie summary collection): detailed narrative content
   - Plot summaries
   - Themes and story elements
   - Actor roles and character information
   - Example questions:
     - \"What is the plot of X?\"
     - \"movies about Y theme\"
     - \"who played Z character?\"
     - \"find movies similar to X\"

Decide whether the question requires:
1. STATISTICS - for rental, inventory, popularity or basic facts
2. RETRIEVAL - for plot, theme, character or similarity questions
3. BOTH - only if the question explicitly needs rental metrics combined with detailed content

Decision rules:
1. Asking about rentals, counts or popularity -> STATISTICS
2. Asking about plot, story, characters or similar movies -> RETRIEVAL
3. Explicitly combining rental metrics with content details -> BOTH
4. If the user explicitly asks for the statistics database, answer STATISTICS or BOTH
5. If the question continues a previous turn that was answered from statistics, answer STATISTICS

Respond with exactly one word: RETRIEVAL, STATISTICS, or BOTH.";

/// Build the routing prompt for a (possibly context-prefixed) question
pub fn routing_prompt(question: &str) -> String {
    format!(
        "Given the user question:\n{}\n{}\n{}\n\n{}",
        QUESTION_OPEN, question, QUESTION_CLOSE, ROUTING_INSTRUCTIONS
    )
}

pub struct Classifier {
    generator: Arc<dyn TextGenerator>,
}

impl Classifier {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Run one routing generation call and validate its output
    pub async fn classify(&self, question: &str) -> Result<RouteDecision, RouteError> {
        let raw = self
            .generator
            .generate(&routing_prompt(question))
            .await
            .map_err(RouteError::ClassificationFailure)?;

        let decision = RouteDecision::parse(&raw);
        if decision.is_unknown() {
            warn!("Classifier ({}) returned unrecognized label: {:?}", self.generator.name(), raw);
        } else {
            debug!("Classifier decision: {:?}", decision);
        }

        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MockTextGenerator;
    use crate::types::Route;

    /// Stand-in model that follows the prompt's decision rules by keyword
    fn keyword_model() -> MockTextGenerator {
        MockTextGenerator::from_fn(|prompt| {
            let start = prompt
                .find(QUESTION_OPEN)
                .ok_or_else(|| anyhow::anyhow!("prompt has no question"))?
                + QUESTION_OPEN.len();
            let end = prompt
                .find(QUESTION_CLOSE)
                .ok_or_else(|| anyhow::anyhow!("prompt has no question"))?;
            let question = prompt[start..end].to_lowercase();

            let stats = ["rent", "count", "popular", "how many", "rating", "released"]
                .iter()
                .any(|w| question.contains(w));
            let content = ["plot", "theme", "character", "similar", "story", "describe"]
                .iter()
                .any(|w| question.contains(w));

            let label = match (stats, content) {
                (true, true) => "BOTH",
                (true, false) => "STATISTICS",
                _ => "RETRIEVAL",
            };
            Ok(label.to_string())
        })
    }

    #[test]
    fn test_prompt_carries_question_and_rules() {
        let prompt = routing_prompt("What are the top 5 most rented comedy movies?");
        assert!(prompt.contains("<<<\nWhat are the top 5 most rented comedy movies?\n>>>"));
        assert!(prompt.contains("rentals, counts or popularity -> STATISTICS"));
        assert!(prompt.contains("plot, story, characters or similar movies -> RETRIEVAL"));
        assert!(prompt.contains("explicitly asks for the statistics database"));
        assert!(prompt.ends_with("RETRIEVAL, STATISTICS, or BOTH."));
    }

    #[tokio::test]
    async fn test_rental_vocabulary_never_routes_to_retrieval_alone() {
        let classifier = Classifier::new(Arc::new(keyword_model()));
        let questions = [
            "What are the top 5 most rented comedy movies?",
            "Which actors appear most frequently in our rental inventory?",
            "How many times was Academy Dinosaur rented?",
            "What are the most popular genres this year?",
            "Find horror movies with high rental counts and describe their plots",
        ];

        for question in questions {
            let decision = classifier.classify(question).await.unwrap();
            assert!(
                matches!(decision.route(), Route::Statistics | Route::Both),
                "{} routed to {:?}",
                question,
                decision
            );
        }
    }

    #[tokio::test]
    async fn test_plot_question_routes_to_retrieval() {
        let classifier = Classifier::new(Arc::new(keyword_model()));
        let decision = classifier
            .classify("Tell me about movies involving time travel and their plots")
            .await
            .unwrap();
        assert_eq!(decision, RouteDecision::Retrieval);
    }

    #[tokio::test]
    async fn test_generation_error_is_classification_failure() {
        let classifier = Classifier::new(Arc::new(MockTextGenerator::failing("rate limited")));
        let err = classifier.classify("anything").await.unwrap_err();
        assert!(matches!(err, RouteError::ClassificationFailure(_)));
        assert_eq!(err.to_string(), "Error classifying question: rate limited");
    }

    #[tokio::test]
    async fn test_unparseable_output_is_unknown() {
        let classifier = Classifier::new(Arc::new(MockTextGenerator::fixed("UNKNOWN")));
        let decision = classifier.classify("anything").await.unwrap();
        assert_eq!(decision, RouteDecision::Unknown("UNKNOWN".to_string()));
    }
}
