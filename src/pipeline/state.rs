//! The Pipeline Controller's state machine (§4.8).
//!
//! Generalizes the teacher's six-state `{Idle, Recording, Transcribing,
//! Correcting, Result, Error}` machine into the eleven states a full
//! utterance actually passes through, including the `Arming`/`Finalizing`
//! boundary states and an explicit `Cancelled` terminal distinct from
//! `Failed`.

/// The taxonomy of fatal failures a [`PipelineState::Failed`] can carry
/// (§7). `Insertion` never appears here — a failed insertion degrades to
/// `Completed` with the text deferred to the clipboard, it is never fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Permission,
    Capture,
    Provider,
    Internal,
}

impl FailureKind {
    pub fn label(&self) -> &'static str {
        match self {
            FailureKind::Permission => "permission",
            FailureKind::Capture => "capture",
            FailureKind::Provider => "provider",
            FailureKind::Internal => "internal",
        }
    }
}

/// States of the voice dictation pipeline.
///
/// ```text
/// Idle ──start──► Arming ──armed──► Recording ⇄ Paused
/// Recording ──stop──► Finalizing ──short/silent──► Completed (no-op)
/// Finalizing ──ok──► Transcribing ──ok──► (classify)
///   classify=Command ──► Processing ──ok/timeout──► Inserting
///   classify≠Command ──► Inserting
/// Inserting ──ok/deferred──► Completed
/// (any) ──cancel──► Cancelled
/// (any) ──fatal error──► Failed(kind)
/// Completed|Cancelled|Failed ──► Idle
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineState {
    /// Waiting for the push-to-talk hotkey.
    Idle,
    /// The capture device is being opened.
    Arming,
    /// Audio is being captured.
    Recording,
    /// Capture is suspended; buffered samples are kept.
    Paused,
    /// Capture has stopped; the clip is being analyzed for speech content.
    Finalizing,
    /// The clip is being sent to the Transcription Orchestrator.
    Transcribing,
    /// The utterance was classified as a command; the AI Command Processor
    /// is running.
    Processing,
    /// The Text Insertion Engine is placing the final text.
    Inserting,
    /// The utterance finished, successfully or as a deliberate no-op.
    Completed,
    /// The utterance was cancelled before it could complete.
    Cancelled,
    /// The utterance ended in an unrecoverable error.
    Failed(FailureKind),
}

impl PipelineState {
    /// `true` while an utterance is actively in flight. The controller
    /// rejects a new `start` while busy.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            PipelineState::Arming
                | PipelineState::Recording
                | PipelineState::Paused
                | PipelineState::Finalizing
                | PipelineState::Transcribing
                | PipelineState::Processing
                | PipelineState::Inserting
        )
    }

    /// `true` for the three states that transition back to `Idle` on their
    /// own (§3's "Completed/Failed transition back to Idle" plus Cancelled).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineState::Completed | PipelineState::Cancelled | PipelineState::Failed(_)
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            PipelineState::Idle => "Idle",
            PipelineState::Arming => "Arming",
            PipelineState::Recording => "Recording",
            PipelineState::Paused => "Paused",
            PipelineState::Finalizing => "Finalizing",
            PipelineState::Transcribing => "Transcribing",
            PipelineState::Processing => "Processing",
            PipelineState::Inserting => "Inserting",
            PipelineState::Completed => "Completed",
            PipelineState::Cancelled => "Cancelled",
            PipelineState::Failed(_) => "Failed",
        }
    }
}

impl Default for PipelineState {
    fn default() -> Self {
        PipelineState::Idle
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_is_not_busy() {
        assert!(!PipelineState::Idle.is_busy());
    }

    #[test]
    fn recording_and_processing_are_busy() {
        assert!(PipelineState::Recording.is_busy());
        assert!(PipelineState::Paused.is_busy());
        assert!(PipelineState::Processing.is_busy());
        assert!(PipelineState::Inserting.is_busy());
    }

    #[test]
    fn terminal_states_are_not_busy() {
        assert!(!PipelineState::Completed.is_busy());
        assert!(!PipelineState::Cancelled.is_busy());
        assert!(!PipelineState::Failed(FailureKind::Internal).is_busy());
    }

    #[test]
    fn terminal_classification_is_correct() {
        assert!(PipelineState::Completed.is_terminal());
        assert!(PipelineState::Cancelled.is_terminal());
        assert!(PipelineState::Failed(FailureKind::Provider).is_terminal());
        assert!(!PipelineState::Recording.is_terminal());
        assert!(!PipelineState::Idle.is_terminal());
    }

    #[test]
    fn default_state_is_idle() {
        assert_eq!(PipelineState::default(), PipelineState::Idle);
    }

    #[test]
    fn failure_kind_labels() {
        assert_eq!(FailureKind::Permission.label(), "permission");
        assert_eq!(FailureKind::Capture.label(), "capture");
        assert_eq!(FailureKind::Provider.label(), "provider");
        assert_eq!(FailureKind::Internal.label(), "internal");
    }
}
