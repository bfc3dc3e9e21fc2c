//! Orchestrator: classify, dispatch to one or both sources, fuse

use crate::backends::{RetrievalBackend, StatisticsBackend, TextGenerator};
use crate::classifier::Classifier;
use crate::config::{FusionFallback, OrchestratorSettings};
use crate::error::RouteError;
use crate::fuser::Fuser;
use crate::history::contextualize;
use crate::types::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Main orchestrator (immutable, shared across requests via Arc)
pub struct Orchestrator {
    classifier: Classifier,
    fuser: Fuser,
    retrieval: Arc<dyn RetrievalBackend>,
    statistics: Arc<dyn StatisticsBackend>,
    settings: OrchestratorSettings,
}

pub type SharedOrchestrator = Arc<Orchestrator>;

/// Outcome of the branch that ran after classification
struct BranchOutcome {
    response: String,
    sources: Vec<SourceAnswer>,
    errors: Vec<String>,
}

impl Orchestrator {
    /// Create an orchestrator whose classifier and fuser share one generator
    pub fn new(
        retrieval: Arc<dyn RetrievalBackend>,
        statistics: Arc<dyn StatisticsBackend>,
        generator: Arc<dyn TextGenerator>,
        settings: OrchestratorSettings,
    ) -> SharedOrchestrator {
        Self::with_generators(retrieval, statistics, generator.clone(), generator, settings)
    }

    pub fn with_generators(
        retrieval: Arc<dyn RetrievalBackend>,
        statistics: Arc<dyn StatisticsBackend>,
        classifier_gen: Arc<dyn TextGenerator>,
        fuser_gen: Arc<dyn TextGenerator>,
        settings: OrchestratorSettings,
    ) -> SharedOrchestrator {
        Arc::new(Self {
            classifier: Classifier::new(classifier_gen),
            fuser: Fuser::new(fuser_gen, settings.max_fused_chars),
            retrieval,
            statistics,
            settings,
        })
    }

    /// Main entry point: route one question and produce the final answer.
    ///
    /// Never fails; every failure is reported through `error` next to a
    /// non-empty `response`.
    pub async fn process_question(&self, question: &str) -> OrchestrationResult {
        self.run(question, question).await
    }

    /// Same as [`process_question`](Self::process_question), with prior
    /// turns prepended as routing and retrieval context
    pub async fn process_question_with_history(
        &self,
        question: &str,
        history: &[ChatMessage],
    ) -> OrchestrationResult {
        let contextualized = contextualize(question, history, self.settings.context_window);
        self.run(question, &contextualized).await
    }

    async fn run(&self, question: &str, prompt_text: &str) -> OrchestrationResult {
        let start = Instant::now();
        info!("Processing question: '{}'", question);

        // START -> CLASSIFIED
        let decision = match self.classifier.classify(prompt_text).await {
            Ok(decision) => decision,
            Err(e) => {
                error!("Classification failed: {}", e);
                let message = e.to_string();
                return OrchestrationResult {
                    question: question.to_string(),
                    response: message.clone(),
                    route_taken: None,
                    decision: None,
                    sources: vec![],
                    error: Some(message),
                };
            }
        };

        let route = decision.route();
        if decision.is_unknown() {
            warn!("Unrecognized classifier decision {:?}, falling back to {}", decision, route);
        }
        info!("Route: {}", route);

        // CLASSIFIED -> *_DONE
        let outcome = match route {
            Route::Retrieval => self.run_retrieval(prompt_text).await,
            Route::Statistics => self.run_statistics(prompt_text).await,
            Route::Both => self.run_both(prompt_text).await,
        };

        // *_DONE -> END
        let error = if outcome.errors.is_empty() {
            None
        } else {
            Some(outcome.errors.join("; "))
        };

        info!(
            "Question answered via {} in {}ms ({} chars, error={})",
            route,
            start.elapsed().as_millis(),
            outcome.response.len(),
            error.is_some()
        );

        OrchestrationResult {
            question: question.to_string(),
            response: outcome.response,
            route_taken: Some(route),
            decision: Some(decision),
            sources: outcome.sources,
            error,
        }
    }

    async fn run_retrieval(&self, question: &str) -> BranchOutcome {
        let (answer, err) = self.call_retrieval(question).await;
        let response = non_empty(answer.text.clone(), Source::Retrieval);
        BranchOutcome {
            response,
            sources: vec![answer],
            errors: err.into_iter().collect(),
        }
    }

    async fn run_statistics(&self, question: &str) -> BranchOutcome {
        let (answer, err) = self.call_statistics(question).await;
        let response = match answer.generated_query {
            Some(ref query) => format!("Generated query: {}\nAnswer: {}", query, answer.text),
            None => answer.text.clone(),
        };
        BranchOutcome {
            response: non_empty(response, Source::Statistics),
            sources: vec![answer],
            errors: err.into_iter().collect(),
        }
    }

    async fn run_both(&self, question: &str) -> BranchOutcome {
        // Independent calls; neither gates the other
        let ((stats, stats_err), (retrieval, retrieval_err)) = futures::join!(
            self.call_statistics(question),
            self.call_retrieval(question)
        );

        let mut errors: Vec<String> = stats_err.into_iter().chain(retrieval_err).collect();

        let response = match self.fuser.fuse(question, &stats.text, &retrieval.text).await {
            Ok(fused) => fused,
            Err(e) => {
                error!("Fusion failed: {}", e);
                let message = e.to_string();
                errors.push(message.clone());
                match self.settings.fusion_fallback {
                    FusionFallback::ErrorMessage => message,
                    FusionFallback::Concatenate => concatenate(&stats.text, &retrieval.text),
                }
            }
        };

        BranchOutcome {
            response,
            sources: vec![stats, retrieval],
            errors,
        }
    }

    /// Call the retrieval backend, degrading failures to inline text
    async fn call_retrieval(&self, question: &str) -> (SourceAnswer, Option<String>) {
        match self.retrieval.retrieve(question).await {
            Ok(answer) => (SourceAnswer::retrieval(answer.answer), None),
            Err(e) => {
                let err = RouteError::downstream(Source::Retrieval, e);
                warn!("{} via {}", err, self.retrieval.name());
                let message = err.to_string();
                (SourceAnswer::retrieval(message.clone()), Some(message))
            }
        }
    }

    /// Call the statistics backend, degrading failures to inline text
    async fn call_statistics(&self, question: &str) -> (SourceAnswer, Option<String>) {
        match self.statistics.query_stats(question).await {
            Ok(answer) => (
                SourceAnswer::statistics(answer.answer, Some(answer.generated_query)),
                None,
            ),
            Err(e) => {
                let err = RouteError::downstream(Source::Statistics, e);
                warn!("{} via {}", err, self.statistics.name());
                let message = err.to_string();
                (SourceAnswer::statistics(message.clone(), None), Some(message))
            }
        }
    }
}

fn concatenate(stats_answer: &str, retrieval_answer: &str) -> String {
    format!(
        "Rental statistics:\n{}\n\nMovie details:\n{}",
        stats_answer, retrieval_answer
    )
}

fn non_empty(response: String, source: Source) -> String {
    if response.trim().is_empty() {
        format!("The {} service returned an empty answer.", source)
    } else {
        response
    }
}
