//! Cleanup applied to every answer before it is returned.

use std::collections::HashSet;

use crate::config::PipelineConfig;

/// Returned when the answer is too short to be useful.
pub const APOLOGY: &str =
    "I apologize, but I couldn't generate a suitable answer to your question.";

/// Message substituted for a repetitive answer.
pub fn rephrase_message(question: &str) -> String {
    format!(
        "Regarding your question about '{question}', I can provide some information but my \
         response generation is limited. Please try rephrasing your question for better results."
    )
}

/// Trim, drop a dangling trailing sentence, and reject degenerate output.
pub fn post_process(answer: &str, question: &str, config: &PipelineConfig) -> String {
    let trimmed = answer.trim();
    if trimmed.chars().count() < config.min_answer_chars {
        return APOLOGY.to_string();
    }

    let cleaned = drop_trailing_fragment(trimmed, config.trailing_fragment_chars);

    if is_repetitive(&cleaned, config.repetition_ratio) {
        return rephrase_message(question);
    }

    cleaned
}

/// Remove the text after the last period when it is shorter than `min_chars`.
fn drop_trailing_fragment(text: &str, min_chars: usize) -> String {
    match text.rsplit_once('.') {
        Some((head, tail)) if tail.trim().chars().count() < min_chars => format!("{head}."),
        _ => text.to_string(),
    }
}

fn is_repetitive(text: &str, ratio: f32) -> bool {
    let words: Vec<&str> = text.split_whitespace().collect();
    let unique: HashSet<&str> = words.iter().copied().collect();
    (unique.len() as f32) < words.len() as f32 * ratio
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_short_answer_becomes_apology() {
        let config = PipelineConfig::default();
        assert_eq!(post_process("  ok  ", "q", &config), APOLOGY);
        assert_eq!(post_process("", "q", &config), APOLOGY);
    }

    #[test]
    fn test_trailing_fragment_is_dropped() {
        let config = PipelineConfig::default();
        let answer = post_process(
            "Vectors are normalized first. Then they are compared. And th",
            "q",
            &config,
        );
        assert_eq!(answer, "Vectors are normalized first. Then they are compared.");
    }

    #[test]
    fn test_long_trailing_sentence_is_kept() {
        let config = PipelineConfig::default();
        let text = "Vectors are normalized. The index then ranks every stored vector";
        assert_eq!(post_process(text, "q", &config), text);
    }

    #[test]
    fn test_text_without_periods_is_unchanged() {
        let config = PipelineConfig::default();
        assert_eq!(post_process("  a plain answer  ", "q", &config), "a plain answer");
    }

    #[test]
    fn test_repetitive_answer_is_replaced() {
        let config = PipelineConfig::default();
        let answer = post_process(&"data ".repeat(20), "What is data?", &config);
        assert_eq!(answer, rephrase_message("What is data?"));
    }
}
