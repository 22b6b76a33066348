//! `LlmProvider` — the remote LLM call behind the AI Command Processor.
//!
//! Grounded directly in the teacher's `llm::corrector::LlmCorrector`/
//! `ApiCorrector` pair: an object-safe async trait plus one `reqwest`-backed
//! implementation. Generalized from an OpenAI-*compatible* configurable
//! `base_url` (the teacher supports Ollama/Groq/LM Studio/vLLM) to a fixed
//! OpenAI chat-completions endpoint, since §6's locked configuration schema
//! has no `base_url` field — the same simplification
//! `transcription::provider::OpenAiSttProvider` makes for the STT call.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum AiError {
    #[error("invalid API key")]
    InvalidKey,
    #[error("rate limit exceeded")]
    RateLimited,
    #[error("AI request failed: {0}")]
    Other(String),
    #[error("AI request timed out")]
    Timeout,
    #[error("request was cancelled")]
    Cancelled,
}

impl From<reqwest::Error> for AiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AiError::Timeout
        } else {
            AiError::Other(e.to_string())
        }
    }
}

/// One attempt at calling a remote LLM with a prepared system/user message
/// pair. Implementations must not retry internally — the echo-guard retry
/// and the rest of the policy belong to [`super::processor::AiCommandProcessor`].
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        model: &str,
        temperature: f32,
    ) -> Result<String, AiError>;
}

const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn LlmProvider>) {}
};

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Calls OpenAI's `/v1/chat/completions` endpoint.
pub struct OpenAiLlmProvider {
    client: reqwest::Client,
    api_key: String,
}

impl OpenAiLlmProvider {
    /// Builds a client with the given per-call timeout. Falls back to an
    /// unconfigured client on builder failure, matching
    /// `ApiCorrector::from_config`'s fallback.
    pub fn new(api_key: String, timeout: std::time::Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client, api_key }
    }
}

#[async_trait]
impl LlmProvider for OpenAiLlmProvider {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        model: &str,
        temperature: f32,
    ) -> Result<String, AiError> {
        let body = serde_json::json!({
            "model": model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt },
            ],
            "temperature": temperature,
        });

        let mut request = self.client.post(CHAT_COMPLETIONS_URL).json(&body);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request.send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(AiError::InvalidKey);
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AiError::RateLimited);
        }
        if !status.is_success() {
            return Err(AiError::Other(format!("unexpected status: {status}")));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AiError::Other(format!("failed to parse response: {e}")))?;

        let content = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| AiError::Other("missing choices[0].message.content".into()))?
            .trim()
            .to_string();

        Ok(content)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_builds_without_panic() {
        let _provider = OpenAiLlmProvider::new("sk-test".into(), std::time::Duration::from_secs(5));
    }

    #[test]
    fn provider_is_object_safe() {
        let provider: Box<dyn LlmProvider> =
            Box::new(OpenAiLlmProvider::new("sk-test".into(), std::time::Duration::from_secs(5)));
        drop(provider);
    }
}
