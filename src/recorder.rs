//! Recorder — owns the capture → resample → downmix → ring-buffer pipeline
//! and assembles a finished [`AudioClip`] when a dictation turn ends.
//!
//! Generalizes the teacher's inline `PipelineOrchestrator::handle_pressed`/
//! `handle_released` pair (which cleared/drained a bare `RingBuffer<f32>`
//! around a single push-to-talk press) into an explicit state machine with
//! pause/resume and cancellation, and converts to 16-bit PCM at stop time
//! since that is the wire format the Transcription Orchestrator sends.
//!
//! Every public method takes `&self` — all mutable state lives behind the
//! internal mutex — so the Pipeline Controller can hold this behind a plain
//! `Arc<Recorder>` and register the same `Arc` with the Service Registry for
//! lifecycle management (§4.1's "components resolve collaborators through
//! this call").

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::audio::{
    resample_to_16k, stereo_to_mono, vad, AudioCapture, AudioChunk, CaptureError, RingBuffer,
    StreamHandle,
};
use crate::model::{AudioClip, PausedInterval, VoiceActivityStats};
use crate::registry::Service;

const TARGET_SAMPLE_RATE: u32 = 16_000;

#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("no input device available: {0}")]
    Capture(#[from] CaptureError),
    #[error("recorder is already recording")]
    AlreadyRecording,
    #[error("recorder is not currently recording")]
    NotRecording,
    #[error("recording exceeded the configured maximum length")]
    TooLong,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecorderPhase {
    Idle,
    Recording,
    Paused,
}

struct Inner {
    phase: RecorderPhase,
    samples: Vec<i16>,
    started_at: Instant,
    paused_intervals: Vec<PausedInterval>,
    pause_started: Option<Instant>,
    running_stats: VoiceActivityStats,
    level_bars: [f32; 10],
    stream: Option<StreamHandle>,
    device_name: Option<String>,
}

impl Inner {
    fn fresh(device_name: Option<String>) -> Self {
        Self {
            phase: RecorderPhase::Idle,
            samples: Vec::new(),
            started_at: Instant::now(),
            paused_intervals: Vec::new(),
            pause_started: None,
            running_stats: VoiceActivityStats::default(),
            level_bars: [0.0; 10],
            stream: None,
            device_name,
        }
    }
}

/// Wraps microphone capture into the discrete start/pause/resume/stop/cancel
/// contract the Pipeline Controller drives.
///
/// Holds no hotkey or controller knowledge itself — it is a pure audio
/// component, matching the separation the teacher keeps between
/// `AudioCapture` (device I/O) and `PipelineOrchestrator` (policy).
pub struct Recorder {
    max_recording_secs: f32,
    ring_buffer_chunks: usize,
    inner: Mutex<Inner>,
}

impl Recorder {
    pub fn new(max_recording_secs: f32, ring_buffer_chunks: usize) -> Self {
        Self {
            max_recording_secs,
            ring_buffer_chunks,
            inner: Mutex::new(Inner::fresh(None)),
        }
    }

    /// Confirms a capture device is reachable without starting a stream.
    /// Surfaces as a typed error rather than panicking so the controller can
    /// notify the user instead of crashing the daemon.
    pub fn check_permission(&self) -> Result<(), RecorderError> {
        AudioCapture::new()?;
        Ok(())
    }

    /// Records the preferred input device name for the next `start` call.
    /// `None` restores the system default.
    pub fn set_device(&self, device_name: Option<String>) {
        self.inner.lock().unwrap().device_name = device_name;
    }

    /// Begins capture. Per-chunk audio flows through `resample_to_16k` →
    /// `stereo_to_mono` → i16 conversion → the in-memory sample buffer, with
    /// running [`VoiceActivityStats`] and level bars updated on each chunk.
    pub fn start(self: &Arc<Self>) -> Result<(), RecorderError> {
        let device_name = {
            let mut inner = self.inner.lock().unwrap();
            if inner.phase != RecorderPhase::Idle {
                return Err(RecorderError::AlreadyRecording);
            }
            let device_name = inner.device_name.clone();
            *inner = Inner::fresh(device_name.clone());
            inner.phase = RecorderPhase::Recording;
            device_name
        };
        let _ = device_name; // device selection by name is a future extension point

        let capture = AudioCapture::new()?;
        let (tx, rx) = std::sync::mpsc::channel::<AudioChunk>();
        let handle = capture.start(tx)?;

        let this = Arc::clone(self);
        let ring_capacity = self.ring_buffer_chunks.max(1) * 4096;
        std::thread::Builder::new()
            .name("audio-resample".into())
            .spawn(move || {
                let mut overflow_guard: RingBuffer<i16> = RingBuffer::new(ring_capacity);
                while let Ok(chunk) = rx.recv() {
                    let mono = stereo_to_mono(&chunk.samples, chunk.channels);
                    let resampled = resample_to_16k(&mono, chunk.sample_rate);
                    let pcm: Vec<i16> = resampled
                        .iter()
                        .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                        .collect();

                    let mut guard = this.inner.lock().unwrap();
                    if guard.phase != RecorderPhase::Recording {
                        continue;
                    }

                    let analysis = vad::analyze_chunk(&pcm);
                    guard.running_stats = analysis.stats;
                    for bar in guard.level_bars.iter_mut() {
                        *bar = vad::smooth_level(*bar, analysis.stats.rms);
                    }

                    overflow_guard.push_slice(&pcm);
                    guard.samples.extend(overflow_guard.drain());
                }
            })
            .expect("failed to spawn audio-resample thread");

        self.inner.lock().unwrap().stream = Some(handle);
        Ok(())
    }

    /// Pauses capture without discarding samples already buffered. Audio
    /// arriving while paused is dropped by the resample thread.
    pub fn pause(&self) -> Result<(), RecorderError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.phase != RecorderPhase::Recording {
            return Err(RecorderError::NotRecording);
        }
        inner.phase = RecorderPhase::Paused;
        inner.pause_started = Some(Instant::now());
        Ok(())
    }

    pub fn resume(&self) -> Result<(), RecorderError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.phase != RecorderPhase::Paused {
            return Err(RecorderError::NotRecording);
        }
        if let Some(start) = inner.pause_started.take() {
            let started_at = inner.started_at;
            inner.paused_intervals.push(PausedInterval {
                start: start.saturating_duration_since(started_at),
                end: Instant::now().saturating_duration_since(started_at),
            });
        }
        inner.phase = RecorderPhase::Recording;
        Ok(())
    }

    /// Stops capture and returns the finished clip. Dropping the stream
    /// handle tears down the cpal stream (RAII, per [`StreamHandle`]); the
    /// resample thread exits on its own once the channel's sender is dropped.
    pub fn stop(&self) -> Result<AudioClip, RecorderError> {
        let (samples, started_at, paused_intervals) = {
            let mut inner = self.inner.lock().unwrap();
            if inner.phase == RecorderPhase::Idle {
                return Err(RecorderError::NotRecording);
            }
            inner.phase = RecorderPhase::Idle;
            inner.stream = None;
            (
                std::mem::take(&mut inner.samples),
                inner.started_at,
                std::mem::take(&mut inner.paused_intervals),
            )
        };

        let mut clip = AudioClip::new(TARGET_SAMPLE_RATE, started_at);
        clip.samples = samples;
        clip.paused_intervals = paused_intervals;
        Ok(clip)
    }

    /// Stops capture and discards any buffered audio.
    pub fn cancel(&self) {
        let mut inner = self.inner.lock().unwrap();
        let device_name = inner.device_name.clone();
        *inner = Inner::fresh(device_name);
    }

    /// The current recording length, useful for the force-finalize check
    /// against `max_recording_secs`.
    pub fn elapsed(&self) -> Duration {
        let inner = self.inner.lock().unwrap();
        Duration::from_secs_f32(inner.samples.len() as f32 / TARGET_SAMPLE_RATE as f32)
    }

    pub fn exceeds_max_length(&self) -> bool {
        self.elapsed().as_secs_f32() >= self.max_recording_secs
    }

    /// Snapshot of the current running stats, for the controller's transient
    /// status notices.
    pub fn running_stats(&self) -> VoiceActivityStats {
        self.inner.lock().unwrap().running_stats
    }

    pub fn level_bars(&self) -> [f32; 10] {
        self.inner.lock().unwrap().level_bars
    }

    pub fn is_recording(&self) -> bool {
        self.inner.lock().unwrap().phase != RecorderPhase::Idle
    }
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new(600.0, 128)
    }
}

impl Service for Recorder {
    fn initialize(&self) -> anyhow::Result<()> {
        self.check_permission().map_err(|e| anyhow::anyhow!(e))
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
