//! Merges the statistics and retrieval answers into one narrative

use crate::backends::TextGenerator;
use crate::error::RouteError;
use std::sync::Arc;
use tracing::{debug, warn};

/// Build the fusion prompt, labeling each answer by origin
pub fn fusion_prompt(question: &str, stats_answer: &str, retrieval_answer: &str) -> String {
    format!(
        "Given a user question and two different sources of movie information, create a coherent, integrated response.

User Question: {question}

Source 1 (Rental statistics database):
{stats_answer}

Source 2 (Movie plot and content summaries):
{retrieval_answer}

Please analyze both sources and create a comprehensive response that:
1. Integrates relevant information from both sources
2. Highlights any interesting connections or patterns between them
3. Addresses the user's question completely
4. Explicitly notes where one source lacked relevant information

The response should be clear, well-organized, and natural-sounding."
    )
}

pub struct Fuser {
    generator: Arc<dyn TextGenerator>,
    max_chars: usize,
}

impl Fuser {
    pub fn new(generator: Arc<dyn TextGenerator>, max_chars: usize) -> Self {
        Self { generator, max_chars }
    }

    pub async fn fuse(
        &self,
        question: &str,
        stats_answer: &str,
        retrieval_answer: &str,
    ) -> Result<String, RouteError> {
        let prompt = fusion_prompt(question, stats_answer, retrieval_answer);
        let fused = self
            .generator
            .generate(&prompt)
            .await
            .map_err(RouteError::FusionFailure)?;

        if fused.trim().is_empty() {
            return Err(RouteError::FusionFailure(anyhow::anyhow!(
                "{} returned an empty response",
                self.generator.name()
            )));
        }

        debug!("Fused answer: {} chars", fused.chars().count());
        Ok(truncate_chars(fused, self.max_chars))
    }
}

fn truncate_chars(mut text: String, max_chars: usize) -> String {
    if let Some((idx, _)) = text.char_indices().nth(max_chars) {
        warn!("Fused answer exceeds {} chars, truncating", max_chars);
        text.truncate(idx);
    }
    text
}
