use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use ragbot_answer::{
    AnswerPipeline, Backends, ChatMessage, GenerateParams, GenerationError, GenerationProvider,
    PipelineConfig, QuestionType, Result, clarification_message,
};
use ragbot_embeddings::{Fragment, FragmentMetadata, ScoredFragment};

/// Backend that always fails and counts its calls.
#[derive(Default)]
struct Failing {
    calls: AtomicUsize,
}

#[async_trait]
impl GenerationProvider for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    async fn generate(&self, _prompt: &str, _params: &GenerateParams) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(GenerationError::ApiRequest("offline".to_string()))
    }

    async fn chat(&self, _messages: &[ChatMessage], _params: &GenerateParams) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(GenerationError::ApiRequest("offline".to_string()))
    }
}

/// Backend that always answers with a fixed text.
struct Fixed(&'static str);

#[async_trait]
impl GenerationProvider for Fixed {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn generate(&self, _prompt: &str, _params: &GenerateParams) -> Result<String> {
        Ok(self.0.to_string())
    }

    async fn chat(&self, _messages: &[ChatMessage], _params: &GenerateParams) -> Result<String> {
        Ok(self.0.to_string())
    }
}

fn offline_pipeline() -> (AnswerPipeline, Arc<Failing>) {
    let failing = Arc::new(Failing::default());
    let backends = Backends {
        primary: failing.clone(),
        text: failing.clone(),
        alternate: failing.clone(),
    };
    (AnswerPipeline::new(PipelineConfig::default(), backends), failing)
}

fn fixed_pipeline(text: &'static str) -> AnswerPipeline {
    let fixed: Arc<dyn GenerationProvider> = Arc::new(Fixed(text));
    AnswerPipeline::new(
        PipelineConfig::default(),
        Backends {
            primary: fixed.clone(),
            text: fixed.clone(),
            alternate: fixed,
        },
    )
}

fn scored(text: &str, score: f32) -> ScoredFragment {
    ScoredFragment::new(
        Arc::new(Fragment::new(text, FragmentMetadata::from_source("doc1.txt"))),
        score,
    )
}

#[tokio::test]
async fn test_unmatched_question_without_fragments_gets_clarification() {
    let (pipeline, failing) = offline_pipeline();

    let answer = pipeline
        .generate_answer("Best pizza toppings", &[], 512)
        .await;

    assert_eq!(
        answer,
        "I understand you're asking about 'Best pizza toppings'. While I don't have specific \
         information readily available, I'd be happy to help if you could provide more context \
         or try rephrasing your question."
    );
    assert_eq!(failing.calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_offline_definition_uses_retrieved_fragments() {
    let (pipeline, _) = offline_pipeline();
    let fragments = [scored(
        "An embedding is a dense vector that represents text. \
         Embeddings are compared by cosine similarity.",
        0.7,
    )];

    let answer = pipeline
        .answer("What is an embedding?", &fragments, 128)
        .await;

    assert_eq!(answer.question_type, Some(QuestionType::DocumentBased));
    assert_eq!(
        answer.text,
        "Based on the available information: An embedding is a dense vector that represents \
         text. Embeddings are compared by cosine similarity."
    );
}

#[tokio::test]
async fn test_generated_text_is_post_processed() {
    let pipeline = fixed_pipeline("  Cosine similarity compares direction. It ign  ");

    let answer = pipeline
        .generate_answer("Explain cosine similarity", &[], 64)
        .await;

    assert_eq!(answer, "Cosine similarity compares direction.");
}

#[tokio::test]
async fn test_too_short_generation_falls_through_to_canned_answer() {
    let pipeline = fixed_pipeline("ok");

    let answer = pipeline.generate_answer("Is AI useful?", &[], 64).await;

    assert!(answer.starts_with("Artificial Intelligence (AI) refers to"));
}

#[tokio::test]
async fn test_empty_question_returns_error_text() {
    let (pipeline, failing) = offline_pipeline();

    let answer = pipeline.answer("   ", &[], 64).await;

    assert_eq!(answer.question_type, None);
    assert_eq!(
        answer.text,
        "I'm sorry, I encountered an error while generating the answer: question is empty"
    );
    assert_eq!(failing.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_clarification_survives_post_processing() {
    let (pipeline, _) = offline_pipeline();
    let question = "Weather on the coast tomorrow";

    let answer = pipeline.generate_answer(question, &[], 32).await;

    assert_eq!(answer, clarification_message(question));
}

#[tokio::test]
async fn test_connection_check_reports_backend_state() {
    let (offline, _) = offline_pipeline();
    assert!(!offline.check_connection().await);
    assert!(fixed_pipeline("pong").check_connection().await);
}
