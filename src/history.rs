//! Prior-turn context for follow-up questions

use crate::types::{ChatMessage, Role};

/// Prepend the last `window` renderable turns to `question`.
///
/// System turns are skipped. Without any user or assistant turn in the
/// window the question is returned unchanged.
pub fn contextualize(question: &str, history: &[ChatMessage], window: usize) -> String {
    let start = history.len().saturating_sub(window);
    let lines: Vec<String> = history[start..]
        .iter()
        .filter_map(|msg| match msg.role {
            Role::User => Some(format!("User asked: {}", msg.content)),
            Role::Assistant => Some(format!("Assistant answered: {}", msg.content)),
            Role::System => None,
        })
        .collect();

    if lines.is_empty() {
        return question.to_string();
    }

    format!(
        "Previous conversation context:\n{}\n\nCurrent question: {}",
        lines.join("\n"),
        question
    )
}
