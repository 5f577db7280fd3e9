//! Last-resort answers built without a generation backend.
//!
//! Tries an extractive answer from the retrieved fragments first, then a
//! canned answer keyed on the question, then a generic clarification.

use ragbot_embeddings::ScoredFragment;

use crate::classify::Terms;

const DEFINITION_PATTERNS: &[&str] = &["what is", "define", "explain"];
const PROCESS_PATTERNS: &[&str] = &["how", "process", "steps"];
const LIST_PATTERNS: &[&str] = &["list", "types", "kinds", "examples"];

const PROCESS_CONTENT: &[&str] = &["step", "process", "method", "algorithm"];
const PROCESS_MARKERS: &[&str] = &["step", "first", "then", "next", "finally"];
const LIST_BULLETS: &[&str] = &["-", "•", "1.", "2.", "3."];

/// A canned answer and the keywords that select it.
struct Canned {
    keywords: &'static [&'static str],
    answer: &'static str,
}

const CANNED: &[Canned] = &[
    Canned {
        keywords: &["machine learning", "ml"],
        answer: "Machine learning is a field of AI that enables computers to learn from data \
                 without explicit programming. It includes supervised, unsupervised, and \
                 reinforcement learning approaches.",
    },
    Canned {
        keywords: &["ai", "artificial intelligence"],
        answer: "Artificial Intelligence (AI) refers to computer systems that can perform tasks \
                 typically requiring human intelligence, such as reasoning, learning, and \
                 perception.",
    },
    Canned {
        keywords: &["help", "assistance", "support"],
        answer: "I'm here to help! You can ask me questions about machine learning, AI, or any \
                 topics in the uploaded documents. Try asking specific questions about concepts \
                 you'd like to understand better.",
    },
];

/// Message used when nothing better is available.
pub fn clarification_message(question: &str) -> String {
    format!(
        "I understand you're asking about '{question}'. While I don't have specific information \
         readily available, I'd be happy to help if you could provide more context or try \
         rephrasing your question."
    )
}

/// Answer `question` from `fragments` without calling any backend.
pub fn smart_fallback(question: &str, fragments: &[ScoredFragment]) -> String {
    let terms = Terms::new(question);

    // Only the first matching pattern group is tried.
    let extracted = if terms.mentions_any(DEFINITION_PATTERNS) {
        definition_answer(fragments)
    } else if terms.mentions_any(PROCESS_PATTERNS) {
        process_answer(fragments)
    } else if terms.mentions_any(LIST_PATTERNS) {
        list_answer(fragments)
    } else {
        None
    };

    if let Some(answer) = extracted {
        return answer;
    }

    CANNED
        .iter()
        .find(|canned| terms.mentions_any_word(canned.keywords))
        .map_or_else(
            || clarification_message(question),
            |canned| canned.answer.to_string(),
        )
}

fn definition_answer(fragments: &[ScoredFragment]) -> Option<String> {
    let key_sentences: Vec<&str> = fragments
        .iter()
        .take(2)
        .flat_map(|f| f.fragment.text().split('.').take(3))
        .map(str::trim)
        .filter(|s| s.chars().count() > 20)
        .take(2)
        .collect();

    if key_sentences.is_empty() {
        return None;
    }
    Some(format!(
        "Based on the available information: {}.",
        key_sentences.join(". ")
    ))
}

fn process_answer(fragments: &[ScoredFragment]) -> Option<String> {
    fragments.iter().find_map(|f| {
        let text = f.fragment.text();
        if !contains_any(&text.to_lowercase(), PROCESS_CONTENT) {
            return None;
        }
        let steps: Vec<&str> = text
            .split('.')
            .filter(|s| contains_any(&s.to_lowercase(), PROCESS_MARKERS))
            .map(str::trim)
            .take(3)
            .collect();
        if steps.is_empty() {
            None
        } else {
            Some(format!("Here's the process: {}.", steps.join(". ")))
        }
    })
}

fn list_answer(fragments: &[ScoredFragment]) -> Option<String> {
    fragments.iter().find_map(|f| {
        let items: Vec<&str> = f
            .fragment
            .text()
            .lines()
            .map(str::trim)
            .filter(|line| LIST_BULLETS.iter().any(|b| line.starts_with(b)))
            .take(5)
            .collect();
        if items.is_empty() {
            None
        } else {
            Some(format!("Here are some key points: {}.", items.join(", ")))
        }
    })
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}
