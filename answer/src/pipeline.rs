//! The answer pipeline: classify, prompt, generate, clean up.

use ragbot_embeddings::ScoredFragment;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::classify::{QuestionType, classify};
use crate::config::PipelineConfig;
use crate::error::AnswerError;
use crate::fallback::{Backends, GenerationRequest, run_chain};
use crate::generation::GenerateParams;
use crate::postprocess::post_process;
use crate::prompt::build_prompt;
use crate::smart::smart_fallback;

const CONNECTION_CHECK_PROMPT: &str = "Hello, this is a test.";

/// Final answer along with how the question was classified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineAnswer {
    /// Answer text, never empty.
    pub text: String,

    /// Classification, absent when the input was rejected.
    pub question_type: Option<QuestionType>,
}

/// Turns a question and its ranked fragments into an answer.
#[derive(Clone)]
pub struct AnswerPipeline {
    config: PipelineConfig,
    backends: Backends,
}

impl AnswerPipeline {
    pub fn new(config: PipelineConfig, backends: Backends) -> Self {
        Self { config, backends }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Answer `question`. Always returns a non-empty string.
    pub async fn generate_answer(
        &self,
        question: &str,
        fragments: &[ScoredFragment],
        max_tokens: usize,
    ) -> String {
        self.answer(question, fragments, max_tokens).await.text
    }

    /// Like [`generate_answer`](Self::generate_answer) but also reports the
    /// question type.
    pub async fn answer(
        &self,
        question: &str,
        fragments: &[ScoredFragment],
        max_tokens: usize,
    ) -> PipelineAnswer {
        match self.try_answer(question, fragments, max_tokens).await {
            Ok(answer) => answer,
            Err(e) => {
                error!("Error generating answer: {e}");
                PipelineAnswer {
                    text: format!(
                        "I'm sorry, I encountered an error while generating the answer: {e}"
                    ),
                    question_type: None,
                }
            }
        }
    }

    async fn try_answer(
        &self,
        question: &str,
        fragments: &[ScoredFragment],
        max_tokens: usize,
    ) -> Result<PipelineAnswer, AnswerError> {
        if question.trim().is_empty() {
            return Err(AnswerError::EmptyQuestion);
        }

        let question_type = classify(question, fragments, &self.config);
        info!(
            "Using {question_type} approach for: {}...",
            question.chars().take(50).collect::<String>()
        );

        let prompt = build_prompt(question, question_type, fragments, &self.config);
        let request = GenerationRequest {
            prompt: &prompt,
            question_type,
            max_tokens,
        };

        let raw = match run_chain(&self.backends, &request, &self.config).await {
            Some((_, text)) => text,
            None => smart_fallback(question, fragments),
        };

        Ok(PipelineAnswer {
            text: post_process(&raw, question, &self.config),
            question_type: Some(question_type),
        })
    }

    /// Send a short prompt to the primary backend.
    pub async fn check_connection(&self) -> bool {
        match self
            .backends
            .primary
            .generate(CONNECTION_CHECK_PROMPT, &GenerateParams::sampled(10, 0.7))
            .await
        {
            Ok(_) => true,
            Err(e) => {
                error!("Model connection test failed: {e}");
                false
            }
        }
    }
}
