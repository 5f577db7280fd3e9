//! Generation backends.
//!
//! A backend turns a prompt into text, either as a plain completion or as a
//! chat exchange. The pipeline treats every call as fallible.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GenerationError, Result};

/// Sampling parameters for a single generation call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerateParams {
    /// Maximum number of new tokens.
    pub max_tokens: usize,

    /// Sampling temperature.
    pub temperature: f32,

    /// Sample instead of greedy decoding.
    pub do_sample: bool,

    /// Echo the prompt in the output.
    pub return_full_text: bool,
}

impl GenerateParams {
    /// Sampled generation without the prompt echoed back.
    pub fn sampled(max_tokens: usize, temperature: f32) -> Self {
        Self {
            max_tokens,
            temperature,
            do_sample: true,
            return_full_text: false,
        }
    }

    /// Turn sampling off.
    pub fn greedy(mut self) -> Self {
        self.do_sample = false;
        self
    }
}

/// One turn of a chat exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Speaker role (`user`, `assistant`, `system`).
    pub role: String,

    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// A user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Trait for text-generation backends.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Identifier of the backend (usually the model id).
    fn name(&self) -> &str;

    /// Complete a prompt.
    async fn generate(&self, prompt: &str, params: &GenerateParams) -> Result<String>;

    /// Answer a chat exchange.
    async fn chat(&self, messages: &[ChatMessage], params: &GenerateParams) -> Result<String>;
}

/// Hugging Face inference API backend for a single model.
pub struct HuggingFaceGenerator {
    /// API token.
    api_token: Option<String>,

    /// API base URL.
    base_url: String,

    /// HTTP client.
    client: reqwest::Client,

    /// Model id.
    model: String,
}

impl HuggingFaceGenerator {
    /// Create a backend for `model`, reading the token from `HF_TOKEN`.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            api_token: std::env::var("HF_TOKEN").ok(),
            base_url: "https://api-inference.huggingface.co".to_string(),
            client: reqwest::Client::new(),
            model: model.into(),
        }
    }

    /// Set the API token.
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Share an HTTP client between backends.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    async fn post(&self, url: String, body: serde_json::Value) -> Result<reqwest::Response> {
        let api_token = self
            .api_token
            .as_ref()
            .ok_or(GenerationError::ProviderNotConfigured)?;

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {api_token}"))
            .json(&body)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);

            return Err(GenerationError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(GenerationError::ApiRequest(format!(
                "{} returned {status}: {error_text}",
                self.model
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl GenerationProvider for HuggingFaceGenerator {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, params: &GenerateParams) -> Result<String> {
        debug!("Text generation with model: {}", self.model);

        let body = serde_json::json!({
            "inputs": prompt,
            "parameters": {
                "max_new_tokens": params.max_tokens,
                "temperature": params.temperature,
                "do_sample": params.do_sample,
                "return_full_text": params.return_full_text,
            }
        });

        let response = self
            .post(format!("{}/models/{}", self.base_url, self.model), body)
            .await?;
        let outputs: Vec<TextGenerationOutput> = response.json().await?;

        outputs
            .into_iter()
            .next()
            .map(|o| o.generated_text)
            .ok_or_else(|| GenerationError::EmptyResponse(self.model.clone()))
    }

    async fn chat(&self, messages: &[ChatMessage], params: &GenerateParams) -> Result<String> {
        debug!("Chat completion with model: {}", self.model);

        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": params.max_tokens,
            "temperature": params.temperature,
        });

        let response = self
            .post(
                format!("{}/models/{}/v1/chat/completions", self.base_url, self.model),
                body,
            )
            .await?;
        let completion: ChatCompletion = response.json().await?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| GenerationError::EmptyResponse(self.model.clone()))
    }
}

#[derive(Debug, Deserialize)]
struct TextGenerationOutput {
    generated_text: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_text_generation_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gpt2"))
            .and(body_partial_json(serde_json::json!({
                "inputs": "Question: hi",
                "parameters": { "max_new_tokens": 20, "do_sample": true }
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([{ "generated_text": "Hello there" }])),
            )
            .mount(&server)
            .await;

        let backend = HuggingFaceGenerator::new("gpt2")
            .with_api_token("hf_test")
            .with_base_url(server.uri());
        let text = backend
            .generate("Question: hi", &GenerateParams::sampled(20, 0.7))
            .await
            .unwrap();

        assert_eq!(text, "Hello there");
    }

    #[tokio::test]
    async fn test_chat_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gpt2/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "role": "assistant", "content": "Sure." } }]
            })))
            .mount(&server)
            .await;

        let backend = HuggingFaceGenerator::new("gpt2")
            .with_api_token("hf_test")
            .with_base_url(server.uri());
        let text = backend
            .chat(&[ChatMessage::user("hi")], &GenerateParams::sampled(20, 0.7))
            .await
            .unwrap();

        assert_eq!(text, "Sure.");
    }

    #[tokio::test]
    async fn test_missing_token_is_not_configured() {
        let backend = HuggingFaceGenerator {
            api_token: None,
            base_url: "http://127.0.0.1:9".to_string(),
            client: reqwest::Client::new(),
            model: "gpt2".to_string(),
        };

        let err = backend
            .generate("hi", &GenerateParams::sampled(5, 0.7))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::ProviderNotConfigured));
    }

    #[tokio::test]
    async fn test_server_error_is_api_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("loading"))
            .mount(&server)
            .await;

        let backend = HuggingFaceGenerator::new("gpt2")
            .with_api_token("hf_test")
            .with_base_url(server.uri());
        let err = backend
            .generate("hi", &GenerateParams::sampled(5, 0.7))
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::ApiRequest(_)));
    }
}
