//! The generation fallback chain.
//!
//! Each strategy makes one backend call and reports an [`Outcome`]. The
//! driver walks [`CHAIN`] in order and stops at the first success whose
//! trimmed text is longer than the configured minimum.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::classify::QuestionType;
use crate::config::{PipelineConfig, StageConfig};
use crate::generation::{ChatMessage, GenerateParams, GenerationProvider, HuggingFaceGenerator};

/// The three generation backends the chain draws on.
#[derive(Clone)]
pub struct Backends {
    /// Main backend for context-based questions.
    pub primary: Arc<dyn GenerationProvider>,
    /// Text-focused backend for general questions.
    pub text: Arc<dyn GenerationProvider>,
    /// Smaller backend of last resort.
    pub alternate: Arc<dyn GenerationProvider>,
}

impl Backends {
    /// Hugging Face backends sharing one HTTP client.
    pub fn hugging_face(base_url: &str, primary: &str, text: &str, alternate: &str) -> Self {
        let client = reqwest::Client::new();
        let build = |model: &str| -> Arc<dyn GenerationProvider> {
            Arc::new(
                HuggingFaceGenerator::new(model)
                    .with_base_url(base_url)
                    .with_client(client.clone()),
            )
        };
        Self {
            primary: build(primary),
            text: build(text),
            alternate: build(alternate),
        }
    }
}

/// Result of a single strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The backend produced text (possibly too short to use).
    Success(String),
    /// The backend call failed.
    Failure(String),
}

/// One way of asking a backend for an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Backend picked by question type, with a type-specific temperature.
    Primary,
    /// Primary backend again, at the retry temperature.
    PrimaryRetry,
    /// Primary backend as a single-turn chat.
    Chat,
    /// Alternate backend with a reduced token budget.
    Alternate,
}

/// Strategies in the order they are tried.
pub const CHAIN: [Strategy; 4] = [
    Strategy::Primary,
    Strategy::PrimaryRetry,
    Strategy::Chat,
    Strategy::Alternate,
];

/// Inputs shared by every strategy of one call.
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    /// Fully built prompt.
    pub prompt: &'a str,
    /// Classification of the question.
    pub question_type: QuestionType,
    /// Caller's token budget.
    pub max_tokens: usize,
}

impl Strategy {
    /// Short name for logs.
    pub fn name(self) -> &'static str {
        match self {
            Strategy::Primary => "primary generation",
            Strategy::PrimaryRetry => "primary retry",
            Strategy::Chat => "chat completion",
            Strategy::Alternate => "alternate backend",
        }
    }

    /// Backend and parameters this strategy uses.
    pub fn plan<'b>(
        self,
        backends: &'b Backends,
        request: &GenerationRequest<'_>,
        stages: &StageConfig,
    ) -> (&'b Arc<dyn GenerationProvider>, GenerateParams) {
        match self {
            Strategy::Primary => match request.question_type {
                QuestionType::General => (
                    &backends.text,
                    GenerateParams::sampled(
                        request.max_tokens.min(stages.general_max_tokens),
                        stages.general_temperature,
                    ),
                ),
                QuestionType::DocumentBased | QuestionType::Hybrid => (
                    &backends.primary,
                    GenerateParams::sampled(request.max_tokens, stages.context_temperature),
                ),
            },
            Strategy::PrimaryRetry | Strategy::Chat => (
                &backends.primary,
                GenerateParams::sampled(request.max_tokens, stages.retry_temperature),
            ),
            Strategy::Alternate => (
                &backends.alternate,
                GenerateParams::sampled(
                    request.max_tokens.min(stages.alternate_max_tokens),
                    stages.alternate_temperature,
                )
                .greedy(),
            ),
        }
    }

    /// Make the backend call.
    pub async fn attempt(
        self,
        backends: &Backends,
        request: &GenerationRequest<'_>,
        stages: &StageConfig,
    ) -> Outcome {
        let (backend, params) = self.plan(backends, request, stages);
        debug!("Trying {} on {}", self.name(), backend.name());

        let result = match self {
            Strategy::Chat => {
                backend
                    .chat(&[ChatMessage::user(request.prompt)], &params)
                    .await
            }
            _ => backend.generate(request.prompt, &params).await,
        };

        match result {
            Ok(text) => Outcome::Success(text),
            Err(e) => Outcome::Failure(e.to_string()),
        }
    }
}

/// Run the chain and return the first usable text with the strategy that
/// produced it, or `None` when every strategy failed.
pub async fn run_chain(
    backends: &Backends,
    request: &GenerationRequest<'_>,
    config: &PipelineConfig,
) -> Option<(Strategy, String)> {
    for strategy in CHAIN {
        match strategy.attempt(backends, request, &config.stages).await {
            Outcome::Success(text) => {
                let trimmed = text.trim();
                if trimmed.chars().count() > config.min_generated_chars {
                    if strategy != Strategy::Primary {
                        info!("Answer produced by fallback: {}", strategy.name());
                    }
                    return Some((strategy, trimmed.to_string()));
                }
                warn!(
                    "{} returned too little text ({} chars)",
                    strategy.name(),
                    trimmed.chars().count()
                );
            }
            Outcome::Failure(reason) => {
                warn!("{} failed: {reason}", strategy.name());
            }
        }
    }

    warn!("All generation strategies failed");
    None
}
