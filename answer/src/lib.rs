//! # Answer
//!
//! Turns a question and the fragments retrieved for it into a final answer.
//!
//! The pipeline classifies the question, builds a prompt for that class,
//! walks an ordered chain of generation strategies, and cleans up the
//! result. Backend failures never reach the caller: when every strategy
//! fails, an extractive or canned answer is returned instead.

pub mod classify;
pub mod config;
pub mod error;
pub mod fallback;
pub mod generation;
pub mod pipeline;
pub mod postprocess;
pub mod prompt;
pub mod smart;

pub use classify::{QuestionType, RULES, Rule, Signals, classify};
pub use config::{PipelineConfig, StageConfig};
pub use error::{AnswerError, GenerationError, Result};
pub use fallback::{Backends, CHAIN, GenerationRequest, Outcome, Strategy, run_chain};
pub use generation::{ChatMessage, GenerateParams, GenerationProvider, HuggingFaceGenerator};
pub use pipeline::{AnswerPipeline, PipelineAnswer};
pub use postprocess::post_process;
pub use prompt::build_prompt;
pub use smart::{clarification_message, smart_fallback};
