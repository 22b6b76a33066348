//! AI Command Processor (C9) — given a command utterance and the current
//! [`Selection`], asks the configured LLM for a rewritten text and returns
//! a cleaned response (§4.5).
//!
//! Owns at most one in-flight request, the same "abort the previous
//! `JoinHandle`" idiom `transcription::orchestrator::TranscriptionOrchestrator`
//! uses for its single-outstanding-call policy, generalized here to also
//! cover the 5-second processing timeout and the echo-guard's single retry.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex as AsyncMutex;
use tokio::task::AbortHandle;

use crate::model::Selection;
use crate::registry::Service;

use super::echo_guard::is_echo;
use super::prompt::{build_system_prompt, build_user_prompt, with_echo_guard_retry};
use super::provider::{AiError, LlmProvider};
use super::sanitize::sanitize;

const PER_CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// The outcome of [`AiCommandProcessor::process`]. `FallThrough` covers both
/// cancellation and timeout: the controller routes the original
/// transcription as plain dictation in either case, per §4.5/§7, and issues
/// no extra notification for it (the cancellation path in particular — the
/// user already knows; the timeout path simply degrades to dictation).
pub enum ProcessOutcome {
    Rewritten(String),
    FallThrough,
}

async fn call_once(
    provider: &Arc<dyn LlmProvider>,
    system_prompt: &str,
    user_prompt: &str,
    model: &str,
    temperature: f32,
) -> Result<String, AiError> {
    let attempt = provider.complete(system_prompt, user_prompt, model, temperature);
    match tokio::time::timeout(PER_CALL_TIMEOUT, attempt).await {
        Ok(result) => result,
        Err(_) => Err(AiError::Timeout),
    }
}

/// Owns the configured provider and the single in-flight call.
pub struct AiCommandProcessor {
    provider: Arc<dyn LlmProvider>,
    current: AsyncMutex<Option<AbortHandle>>,
}

impl AiCommandProcessor {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            current: AsyncMutex::new(None),
        }
    }

    /// Runs the §4.5 algorithm: builds the prompt pair, calls the provider
    /// under a 5 s timeout, retries exactly once (with the echo-guard
    /// sentence appended) if the response echoes a long selection, and
    /// sanitizes whichever response is ultimately used.
    ///
    /// A prior in-flight call is aborted before this one starts, enforcing
    /// the "single outstanding request per pipeline" policy (§4.5).
    pub async fn process(
        &self,
        command: &str,
        selection: &Selection,
        model: &str,
        temperature: f32,
        rules: &[String],
    ) -> Result<ProcessOutcome, AiError> {
        if let Some(prev) = self.current.lock().await.take() {
            prev.abort();
        }

        let system_prompt = build_system_prompt(rules);
        let user_prompt = build_user_prompt(command, &selection.text);

        let provider = Arc::clone(&self.provider);
        let system_prompt_clone = system_prompt.clone();
        let user_prompt_clone = user_prompt.clone();
        let model_owned = model.to_string();

        let handle = tokio::spawn(async move {
            call_once(&provider, &system_prompt_clone, &user_prompt_clone, &model_owned, temperature).await
        });
        *self.current.lock().await = Some(handle.abort_handle());

        let first = match handle.await {
            Ok(result) => result,
            Err(join_error) if join_error.is_cancelled() => return Ok(ProcessOutcome::FallThrough),
            Err(join_error) => return Err(AiError::Other(join_error.to_string())),
        };

        let first_response = match first {
            Ok(text) => text,
            Err(AiError::Timeout) => return Ok(ProcessOutcome::FallThrough),
            Err(e) => return Err(e),
        };

        if !is_echo(&selection.text, &first_response) {
            return Ok(ProcessOutcome::Rewritten(sanitize(&first_response)));
        }

        // Echo-guard retry: second response is used unconditionally (§4.5).
        let retried_prompt = with_echo_guard_retry(&user_prompt);
        let provider = Arc::clone(&self.provider);
        let model_owned = model.to_string();
        let handle = tokio::spawn(async move {
            call_once(&provider, &system_prompt, &retried_prompt, &model_owned, temperature).await
        });
        *self.current.lock().await = Some(handle.abort_handle());

        let second = match handle.await {
            Ok(result) => result,
            Err(join_error) if join_error.is_cancelled() => return Ok(ProcessOutcome::FallThrough),
            Err(join_error) => return Err(AiError::Other(join_error.to_string())),
        };

        match second {
            Ok(text) => Ok(ProcessOutcome::Rewritten(sanitize(&text))),
            Err(AiError::Timeout) => Ok(ProcessOutcome::FallThrough),
            Err(e) => Err(e),
        }
    }

    /// Aborts the in-flight call, if any. Used by the pipeline controller
    /// when the utterance itself is cancelled.
    pub async fn cancel(&self) {
        if let Some(handle) = self.current.lock().await.take() {
            handle.abort();
        }
    }
}

impl Service for AiCommandProcessor {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
