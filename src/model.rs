//! Shared value types that flow between pipeline components.
//!
//! Each component module (`recorder`, `classifier`, `selection`,
//! `transcription`, `ai`, `insertion`, `pipeline`) owns the operations that
//! produce and consume these types; this module only owns their shape.

use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// AudioClip
// ---------------------------------------------------------------------------

/// A half-open pause interval, expressed as offsets from [`AudioClip::started_at`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PausedInterval {
    pub start: Duration,
    pub end: Duration,
}

/// A finalized recording: mono, 16-bit signed PCM at a fixed sample rate.
///
/// Frozen once the Recorder stops or cancels; no sample in `samples` was
/// captured while the Recorder was paused.
#[derive(Debug, Clone)]
pub struct AudioClip {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    pub started_at: Instant,
    pub paused_intervals: Vec<PausedInterval>,
}

impl AudioClip {
    pub fn new(sample_rate: u32, started_at: Instant) -> Self {
        Self {
            samples: Vec::new(),
            sample_rate,
            started_at,
            paused_intervals: Vec::new(),
        }
    }

    /// Duration implied by the sample count, not wall-clock time — this is
    /// exact because paused chunks are never appended in the first place.
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }

    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

// ---------------------------------------------------------------------------
// VoiceActivityStats
// ---------------------------------------------------------------------------

/// Energy statistics computed over an [`AudioClip`] or a single chunk.
///
/// `has_real_speech` follows the full-clip qualification rule: any of
/// `percent_above_threshold > 2`, `average_rms (== rms here) > 20`,
/// `peak_rms > 50`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VoiceActivityStats {
    pub rms: f32,
    pub peak_rms: f32,
    pub percent_above_threshold: f32,
    pub max_consecutive_above_threshold: u32,
    pub has_real_speech: bool,
}

// ---------------------------------------------------------------------------
// Transcription
// ---------------------------------------------------------------------------

/// Options accompanying a single `transcribe` call.
#[derive(Debug, Clone)]
pub struct TranscriptionOptions {
    pub language: String,
    pub model: String,
    pub temperature: f32,
    pub prompt: Option<String>,
    pub use_cache: bool,
}

impl Default for TranscriptionOptions {
    fn default() -> Self {
        Self {
            language: "en".into(),
            model: "whisper-1".into(),
            temperature: 0.0,
            prompt: None,
            use_cache: true,
        }
    }
}

/// The output of a successful transcription call.
#[derive(Debug, Clone)]
pub struct TranscriptionResult {
    pub text: String,
    pub raw_provider_payload: String,
    pub issued_at: Instant,
    pub id: u64,
}

// ---------------------------------------------------------------------------
// Command classification
// ---------------------------------------------------------------------------

/// The Command Classifier's verdict on an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierDecision {
    NotCommand,
    NeedsConfirmation,
    Command,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommandClassification {
    pub confidence: u8,
    pub detected_trigger: Option<String>,
    pub detected_verb: Option<String>,
    pub decision: ClassifierDecision,
}

/// Context flags the controller supplies alongside the utterance text.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassifierContext {
    pub has_highlighted_text: bool,
    pub is_long_dictation: bool,
    pub recent_ai_commands: u32,
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// The foreground application's current text selection, if any.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub text: String,
    pub source_application_name: String,
}

impl Selection {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Insertion
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertionStrategyKind {
    PrimaryPaste,
    SecondaryPaste,
    KeySimulation,
    ClipboardFallback,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InsertionOutcome {
    Success,
    Failure(String),
}

#[derive(Debug, Clone)]
pub struct InsertionAttempt {
    pub strategy: InsertionStrategyKind,
    pub started_at: Instant,
    pub outcome: InsertionOutcome,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_clip_duration_matches_sample_count() {
        let mut clip = AudioClip::new(16_000, Instant::now());
        clip.samples = vec![0; 16_000];
        assert!((clip.duration_secs() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn audio_clip_starts_empty() {
        let clip = AudioClip::new(16_000, Instant::now());
        assert!(clip.is_empty());
        assert_eq!(clip.duration_secs(), 0.0);
    }

    #[test]
    fn selection_empty_has_no_text() {
        assert!(Selection::empty().is_empty());
        let sel = Selection {
            text: "hello".into(),
            source_application_name: "editor".into(),
        };
        assert!(!sel.is_empty());
    }

    #[test]
    fn transcription_options_default_matches_schema() {
        let opts = TranscriptionOptions::default();
        assert_eq!(opts.language, "en");
        assert_eq!(opts.temperature, 0.0);
        assert!(opts.use_cache);
    }

    #[test]
    fn classifier_context_default_is_all_off() {
        let ctx = ClassifierContext::default();
        assert!(!ctx.has_highlighted_text);
        assert!(!ctx.is_long_dictation);
        assert_eq!(ctx.recent_ai_commands, 0);
    }
}
