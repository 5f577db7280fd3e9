//! Question classification.
//!
//! A question is answered from the documents, from a blend of documents and
//! general knowledge, or from general knowledge alone. The decision is an
//! ordered rule table over four boolean signals; the first rule that
//! applies wins and `General` is the fallthrough.

use std::fmt;

use ragbot_embeddings::ScoredFragment;
use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;

/// How a question should be answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    /// Answer from retrieved context.
    DocumentBased,
    /// Blend retrieved context with general knowledge.
    Hybrid,
    /// Answer from general knowledge.
    General,
}

impl QuestionType {
    /// Stable snake_case label.
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionType::DocumentBased => "document_based",
            QuestionType::Hybrid => "hybrid",
            QuestionType::General => "general",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Facts about a question and its retrieved fragments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Signals {
    /// Some fragment scores above the high-relevance threshold.
    pub high_relevance: bool,
    /// Some fragment scores above the medium-relevance threshold.
    pub medium_relevance: bool,
    /// The question mentions a document keyword.
    pub doc_keywords: bool,
    /// The question uses a generic question pattern.
    pub generic_patterns: bool,
}

impl Signals {
    /// Compute the signals for a question.
    pub fn compute(question: &str, fragments: &[ScoredFragment], config: &PipelineConfig) -> Self {
        let terms = Terms::new(question);
        Self {
            high_relevance: fragments
                .iter()
                .any(|f| f.score > config.high_relevance_threshold),
            medium_relevance: fragments
                .iter()
                .any(|f| f.score > config.medium_relevance_threshold),
            doc_keywords: terms.mentions_any(&config.document_keywords),
            generic_patterns: terms.mentions_any(&config.generic_keywords),
        }
    }
}

/// One row of the decision table.
#[derive(Clone, Copy)]
pub struct Rule {
    /// Short description, used in logs.
    pub name: &'static str,
    /// Label returned when the rule applies.
    pub label: QuestionType,
    /// Predicate over the signals.
    pub applies: fn(&Signals) -> bool,
}

/// Decision table, evaluated top to bottom.
pub const RULES: &[Rule] = &[
    Rule {
        name: "high relevance with document keywords",
        label: QuestionType::DocumentBased,
        applies: |s| s.high_relevance && s.doc_keywords,
    },
    Rule {
        name: "medium relevance, or document keywords in a generic question",
        label: QuestionType::Hybrid,
        applies: |s| s.medium_relevance || (s.doc_keywords && s.generic_patterns),
    },
];

/// Pick the label of the first applicable rule.
pub fn decide(signals: &Signals) -> QuestionType {
    RULES
        .iter()
        .find(|rule| (rule.applies)(signals))
        .map_or(QuestionType::General, |rule| rule.label)
}

/// Classify a question against its retrieved fragments.
pub fn classify(
    question: &str,
    fragments: &[ScoredFragment],
    config: &PipelineConfig,
) -> QuestionType {
    decide(&Signals::compute(question, fragments, config))
}

/// Lower-cased view of a text for keyword checks.
pub(crate) struct Terms {
    lowered: String,
    words: Vec<String>,
}

impl Terms {
    pub(crate) fn new(text: &str) -> Self {
        let lowered = text.to_lowercase();
        let words = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect();
        Self { lowered, words }
    }

    /// Whether `keyword` occurs anywhere in the text, inside words included.
    pub(crate) fn mentions(&self, keyword: &str) -> bool {
        self.lowered.contains(&keyword.to_lowercase())
    }

    pub(crate) fn mentions_any<S: AsRef<str>>(&self, keywords: &[S]) -> bool {
        keywords.iter().any(|k| self.mentions(k.as_ref()))
    }

    /// Like [`mentions`](Self::mentions), except that a single keyword of
    /// three characters or fewer ("ai", "ml") must be a whole word.
    pub(crate) fn mentions_word(&self, keyword: &str) -> bool {
        let keyword = keyword.to_lowercase();
        if keyword.chars().count() <= 3 && !keyword.contains(' ') {
            self.words.iter().any(|w| *w == keyword)
        } else {
            self.lowered.contains(&keyword)
        }
    }

    pub(crate) fn mentions_any_word(&self, keywords: &[&str]) -> bool {
        keywords.iter().any(|k| self.mentions_word(k))
    }
}
