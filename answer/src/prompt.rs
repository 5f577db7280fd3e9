//! Prompt templates, one per question type.

use ragbot_embeddings::ScoredFragment;

use crate::classify::QuestionType;
use crate::config::PipelineConfig;

/// Build the prompt for a classified question.
pub fn build_prompt(
    question: &str,
    question_type: QuestionType,
    fragments: &[ScoredFragment],
    config: &PipelineConfig,
) -> String {
    match question_type {
        QuestionType::DocumentBased => {
            let context = context_block(
                fragments,
                "Document",
                config.document_context_threshold,
                config.document_fragment_chars,
            );
            format!(
                "Based on the following context, please answer the question accurately and concisely.\n\n\
                 Context:\n{context}\n\n\
                 Question: {question}\n\n\
                 Answer:"
            )
        }
        QuestionType::Hybrid => {
            let context = context_block(
                fragments,
                "Reference",
                config.hybrid_context_threshold,
                config.hybrid_fragment_chars,
            );
            format!(
                "Answer the following question using both the provided context and your general knowledge.\n\
                 If the context is relevant, use it as supporting information. If not sufficient, expand with general knowledge.\n\n\
                 Context:\n{context}\n\n\
                 Question: {question}\n\n\
                 Answer:"
            )
        }
        QuestionType::General => format!(
            "Please answer the following question based on your general knowledge. Provide a clear and helpful response.\n\n\
             Question: {question}\n\n\
             Answer:"
        ),
    }
}

/// Labeled, truncated fragments scoring strictly above `threshold`.
fn context_block(
    fragments: &[ScoredFragment],
    label: &str,
    threshold: f32,
    max_chars: usize,
) -> String {
    fragments
        .iter()
        .filter(|f| f.score > threshold)
        .map(|f| {
            let text: String = f.fragment.text().chars().take(max_chars).collect();
            format!("{label}: {text}")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
