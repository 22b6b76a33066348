//! Transcription Orchestrator (C8) — audio → text, with caching, retries,
//! and supersede-cancellation.
//!
//! Grounded in the teacher's `ApiCorrector`/`PipelineOrchestrator` pairing:
//! a `reqwest`-backed remote call (here behind [`super::provider::SttProvider`])
//! driven by an orchestrator that owns the cache and the in-flight
//! `JoinHandle`, the same "drop/abort to cancel" idiom the teacher already
//! uses implicitly around `spawn_blocking`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::AbortHandle;

use crate::audio::wav;
use crate::model::{AudioClip, TranscriptionOptions, TranscriptionResult};

use crate::registry::Service;

use super::cache::TranscriptionCache;
use super::fingerprint::cache_key;
use super::provider::{SttProvider, TranscriptionError};

/// Clips at or above this duration are WAV-encoded with the streaming
/// writer rather than buffered wholesale in memory first (§4.4).
pub const STREAMING_THRESHOLD_SECS: f64 = 30.0;
const PER_CALL_TIMEOUT: Duration = Duration::from_secs(10);
const RATE_LIMIT_RETRY_BUDGET: u32 = 1;
const SERVER_ERROR_RETRY_BUDGET: u32 = 2;

/// Converts a finished clip to an on-disk WAV file, returning both the
/// guard (whose `Drop` impl unlinks the file unconditionally, including on
/// every error path below) and the encoded bytes to upload.
fn materialize_wav(clip: &AudioClip) -> Result<(tempfile::NamedTempFile, Vec<u8>), TranscriptionError> {
    let file = tempfile::Builder::new()
        .prefix("whisper-")
        .suffix(".wav")
        .tempfile()
        .map_err(|e| TranscriptionError::Request(format!("failed to create temp file: {e}")))?;

    let bytes = if clip.duration_secs() >= STREAMING_THRESHOLD_SECS {
        let mut writer = std::io::BufWriter::new(file.as_file());
        wav::encode_streaming(&mut writer, &clip.samples, clip.sample_rate)
            .map_err(|e| TranscriptionError::Request(format!("failed to write temp file: {e}")))?;
        use std::io::Write;
        writer
            .flush()
            .map_err(|e| TranscriptionError::Request(format!("failed to flush temp file: {e}")))?;
        wav::encode(&clip.samples, clip.sample_rate)
    } else {
        let bytes = wav::encode(&clip.samples, clip.sample_rate);
        use std::io::Write;
        (&file.as_file()).write_all(&bytes).map_err(|e| {
            TranscriptionError::Request(format!("failed to write temp file: {e}"))
        })?;
        bytes
    };

    Ok((file, bytes))
}

async fn call_with_retry(
    provider: Arc<dyn SttProvider>,
    wav_bytes: Vec<u8>,
    language: String,
    model: String,
    temperature: f32,
    prompt: Option<String>,
) -> Result<String, TranscriptionError> {
    let mut rate_limit_attempts = 0;
    let mut server_error_attempts = 0;

    loop {
        let attempt = provider.transcribe_wav(
            wav_bytes.clone(),
            &language,
            &model,
            temperature,
            prompt.as_deref(),
        );
        let outcome = tokio::time::timeout(PER_CALL_TIMEOUT, attempt)
            .await
            .unwrap_or(Err(TranscriptionError::Timeout));

        match outcome {
            Ok(text) => return Ok(text),
            Err(TranscriptionError::InvalidApiKey) => return Err(TranscriptionError::InvalidApiKey),
            Err(TranscriptionError::RateLimited) if rate_limit_attempts < RATE_LIMIT_RETRY_BUDGET => {
                rate_limit_attempts += 1;
                let jitter_ms = rand::thread_rng().gen_range(0..250);
                tokio::time::sleep(Duration::from_millis(500) + Duration::from_millis(jitter_ms)).await;
            }
            Err(TranscriptionError::RateLimited) => return Err(TranscriptionError::RateLimited),
            Err(e @ TranscriptionError::Request(_)) if server_error_attempts < SERVER_ERROR_RETRY_BUDGET => {
                server_error_attempts += 1;
                let backoff = Duration::from_millis(200 * 2u64.pow(server_error_attempts));
                tokio::time::sleep(backoff).await;
                let _ = e;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Owns the transcription cache and at most one in-flight remote call.
/// `clone()`-friendly provider/cache access is internal; the pipeline
/// controller holds this behind a single `Arc`.
pub struct TranscriptionOrchestrator {
    provider: Arc<dyn SttProvider>,
    cache: AsyncMutex<TranscriptionCache>,
    current: AsyncMutex<Option<AbortHandle>>,
    next_id: AtomicU64,
}

impl TranscriptionOrchestrator {
    pub fn new(provider: Arc<dyn SttProvider>, cache_capacity: usize, cache_ttl: Duration) -> Self {
        Self {
            provider,
            cache: AsyncMutex::new(TranscriptionCache::new(cache_capacity, cache_ttl)),
            current: AsyncMutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    /// Runs the §4.4 algorithm end to end. A call that arrives while a
    /// prior one is in flight aborts the prior one first.
    pub async fn transcribe(
        &self,
        clip: &AudioClip,
        options: &TranscriptionOptions,
    ) -> Result<TranscriptionResult, TranscriptionError> {
        let key = cache_key(clip, options);
        if options.use_cache {
            if let Some(cached) = self.cache.lock().await.get(key) {
                return Ok(cached);
            }
        }

        if let Some(prev) = self.current.lock().await.take() {
            prev.abort();
        }

        let (_temp_file, wav_bytes) = materialize_wav(clip)?;

        let provider = Arc::clone(&self.provider);
        let language = options.language.clone();
        let model = options.model.clone();
        let temperature = options.temperature;
        let prompt = options.prompt.clone();

        let handle = tokio::spawn(call_with_retry(provider, wav_bytes, language, model, temperature, prompt));
        *self.current.lock().await = Some(handle.abort_handle());

        let text = match handle.await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => return Err(e),
            Err(join_error) if join_error.is_cancelled() => return Err(TranscriptionError::Cancelled),
            Err(join_error) => return Err(TranscriptionError::Request(join_error.to_string())),
        };
        // `_temp_file` drops here, unlinking the file on every path above too.

        let result = TranscriptionResult {
            text: text.trim().to_string(),
            raw_provider_payload: String::new(),
            issued_at: Instant::now(),
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
        };

        if options.use_cache {
            self.cache.lock().await.insert(key, result.clone());
        }

        Ok(result)
    }

    /// Aborts the in-flight call, if any. Used by the pipeline controller
    /// when the utterance itself is cancelled.
    pub async fn cancel(&self) {
        if let Some(handle) = self.current.lock().await.take() {
            handle.abort();
        }
    }

    /// Drains cache entries past their TTL. Intended to run on a
    /// low-frequency background timer, not per-call.
    pub async fn sweep_cache(&self) -> usize {
        self.cache.lock().await.sweep_expired()
    }
}

impl Service for TranscriptionOrchestrator {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicU32;

    struct StubProvider {
        calls: AtomicU32,
        responses: Vec<Result<&'static str, TranscriptionError>>,
    }

    #[async_trait]
    impl SttProvider for StubProvider {
        async fn transcribe_wav(
            &self,
            _wav_bytes: Vec<u8>,
            _language: &str,
            _model: &str,
            _temperature: f32,
            _prompt: Option<&str>,
        ) -> Result<String, TranscriptionError> {
            let i = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
            match &self.responses[i.min(self.responses.len() - 1)] {
                Ok(text) => Ok(text.to_string()),
                Err(e) => Err(e.clone()),
            }
        }
    }

    fn clip(samples: Vec<i16>) -> AudioClip {
        let mut c = AudioClip::new(16_000, Instant::now());
        c.samples = samples;
        c
    }

    #[tokio::test]
    async fn successful_transcription_is_trimmed_and_cached() {
        let provider = Arc::new(StubProvider {
            calls: AtomicU32::new(0),
            responses: vec![Ok("  hello world  ")],
        });
        let orchestrator = TranscriptionOrchestrator::new(provider, 10, Duration::from_secs(3600));
        let audio = clip(vec![1, 2, 3, 4]);
        let options = TranscriptionOptions::default();

        let result = orchestrator.transcribe(&audio, &options).await.unwrap();
        assert_eq!(result.text, "hello world");

        let second = orchestrator.transcribe(&audio, &options).await.unwrap();
        assert_eq!(second.id, result.id, "second call must hit the cache, not mint a new id");
    }

    #[tokio::test]
    async fn invalid_api_key_is_not_retried() {
        let provider = Arc::new(StubProvider {
            calls: AtomicU32::new(0),
            responses: vec![Err(TranscriptionError::InvalidApiKey), Ok("should not be reached")],
        });
        let orchestrator = TranscriptionOrchestrator::new(provider, 10, Duration::from_secs(3600));
        let audio = clip(vec![1, 2, 3, 4]);
        let err = orchestrator
            .transcribe(&audio, &TranscriptionOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, TranscriptionError::InvalidApiKey));
    }

    #[tokio::test]
    async fn rate_limit_is_retried_once_then_succeeds() {
        let provider = Arc::new(StubProvider {
            calls: AtomicU32::new(0),
            responses: vec![Err(TranscriptionError::RateLimited), Ok("recovered")],
        });
        let orchestrator = TranscriptionOrchestrator::new(provider, 10, Duration::from_secs(3600));
        let audio = clip(vec![1, 2, 3, 4]);
        let result = orchestrator
            .transcribe(&audio, &TranscriptionOptions::default())
            .await
            .unwrap();
        assert_eq!(result.text, "recovered");
    }

    #[tokio::test]
    async fn cache_is_bypassed_when_use_cache_is_false() {
        let provider = Arc::new(StubProvider {
            calls: AtomicU32::new(0),
            responses: vec![Ok("one"), Ok("two")],
        });
        let orchestrator = TranscriptionOrchestrator::new(provider, 10, Duration::from_secs(3600));
        let audio = clip(vec![1, 2, 3, 4]);
        let mut options = TranscriptionOptions::default();
        options.use_cache = false;

        let first = orchestrator.transcribe(&audio, &options).await.unwrap();
        let second = orchestrator.transcribe(&audio, &options).await.unwrap();
        assert_eq!(first.text, "one");
        assert_eq!(second.text, "two");
    }
}
