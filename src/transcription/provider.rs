//! `SttProvider` — the remote speech-to-text call, abstracted behind a
//! trait so the orchestrator's retry/cache/cancellation logic can be tested
//! against a stub instead of a real HTTP endpoint.
//!
//! Grounded in the teacher's `llm::corrector::LlmCorrector`/`ApiCorrector`
//! pair: an async, object-safe trait plus one `reqwest`-backed
//! implementation built from config, generalized from a JSON chat-completion
//! POST to a multipart file upload.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum TranscriptionError {
    #[error("invalid API key")]
    InvalidApiKey,
    #[error("rate limit exceeded")]
    RateLimited,
    #[error("speech-to-text request failed: {0}")]
    Request(String),
    #[error("speech-to-text request timed out")]
    Timeout,
    #[error("failed to parse speech-to-text response: {0}")]
    Parse(String),
    #[error("request was cancelled")]
    Cancelled,
}

impl From<reqwest::Error> for TranscriptionError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TranscriptionError::Timeout
        } else {
            TranscriptionError::Request(e.to_string())
        }
    }
}

/// One attempt at calling a remote speech-to-text provider with an already
/// WAV-encoded clip. Implementations must not retry internally — retry
/// policy belongs to [`super::orchestrator::TranscriptionOrchestrator`].
#[async_trait]
pub trait SttProvider: Send + Sync {
    async fn transcribe_wav(
        &self,
        wav_bytes: Vec<u8>,
        language: &str,
        model: &str,
        temperature: f32,
        prompt: Option<&str>,
    ) -> Result<String, TranscriptionError>;
}

const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn SttProvider>) {}
};

/// Calls OpenAI's `/v1/audio/transcriptions` endpoint. The locked
/// configuration schema (§6) has no `base_url` field — unlike the teacher's
/// configurable `LlmConfig.base_url` — so this orchestrator hardcodes the
/// OpenAI endpoint rather than generalizing to arbitrary providers.
pub struct OpenAiSttProvider {
    client: reqwest::Client,
    api_key: String,
}

const TRANSCRIPTIONS_URL: &str = "https://api.openai.com/v1/audio/transcriptions";

impl OpenAiSttProvider {
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
impl SttProvider for OpenAiSttProvider {
    async fn transcribe_wav(
        &self,
        wav_bytes: Vec<u8>,
        language: &str,
        model: &str,
        temperature: f32,
        prompt: Option<&str>,
    ) -> Result<String, TranscriptionError> {
        let part = reqwest::multipart::Part::bytes(wav_bytes)
            .file_name("clip.wav")
            .mime_str("audio/wav")
            .map_err(|e| TranscriptionError::Request(e.to_string()))?;

        let mut form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", model.to_string())
            .text("language", language.to_string())
            .text("response_format", "json")
            .text("temperature", temperature.to_string());
        if let Some(prompt) = prompt {
            form = form.text("prompt", prompt.to_string());
        }

        let response = self
            .client
            .post(TRANSCRIPTIONS_URL)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(TranscriptionError::InvalidApiKey);
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(TranscriptionError::RateLimited);
        }
        if status.is_server_error() {
            return Err(TranscriptionError::Request(format!("server error: {status}")));
        }
        if !status.is_success() {
            return Err(TranscriptionError::Request(format!("unexpected status: {status}")));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| TranscriptionError::Parse(e.to_string()))?;

        let text = json["text"]
            .as_str()
            .ok_or_else(|| TranscriptionError::Parse("missing \"text\" field".into()))?
            .trim()
            .to_string();

        Ok(text)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
