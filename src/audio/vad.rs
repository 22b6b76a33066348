//! Energy-based voice-activity analysis over 16-bit PCM audio.
//!
//! Two granularities are computed with the same thresholds: per-chunk (fed
//! by the Recorder as audio streams in, to update a running
//! [`VoiceActivityStats`] and the smoothed level bars) and per-clip (run
//! once at stop, to decide whether the clip is worth transcribing at all).
//!
//! ## Algorithm
//!
//! A sample counts toward "above threshold" when `|sample| > 5`. A chunk
//! qualifies as speech when `percent_above_threshold > 3%` **and**
//! `rms > 50`. A full clip qualifies for transcription when any of
//! `percent_above_threshold > 2`, `average_rms > 20`, `peak_rms > 50` holds
//! **and** the clip is at least 1.5 s long.

use crate::model::{AudioClip, VoiceActivityStats};

/// Samples with `|sample| > ABOVE_THRESHOLD` count toward `percent_above_threshold`.
pub const ABOVE_THRESHOLD: i16 = 5;
/// Chunk-level speech gate on `percent_above_threshold`.
pub const CHUNK_PERCENT_GATE: f32 = 3.0;
/// Chunk-level speech gate on `rms`.
pub const CHUNK_RMS_GATE: f32 = 50.0;
/// Full-clip qualification gate on `percent_above_threshold`.
pub const CLIP_PERCENT_GATE: f32 = 2.0;
/// Full-clip qualification gate on average `rms`.
pub const CLIP_RMS_GATE: f32 = 20.0;
/// Full-clip qualification gate on `peak_rms`.
pub const CLIP_PEAK_GATE: f32 = 50.0;
/// Clips shorter than this are never transcribed, regardless of energy.
pub const MIN_QUALIFYING_SECS: f64 = 1.5;
/// Weight applied to the previous value in the level-bar exponential filter.
pub const LEVEL_SMOOTHING_WEIGHT: f32 = 0.2;

fn stats_over(samples: &[i16]) -> VoiceActivityStats {
    if samples.is_empty() {
        return VoiceActivityStats::default();
    }

    let len = samples.len() as f32;
    let sum_sq: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    let rms = ((sum_sq / samples.len() as f64).sqrt()) as f32;

    let peak_rms = samples
        .iter()
        .map(|&s| (s as f32).abs())
        .fold(0.0_f32, f32::max);

    let above = samples
        .iter()
        .filter(|&&s| (s as i32).abs() > ABOVE_THRESHOLD as i32)
        .count();
    let percent_above_threshold = above as f32 / len * 100.0;

    let mut max_run = 0u32;
    let mut current_run = 0u32;
    for &s in samples {
        if (s as i32).abs() > ABOVE_THRESHOLD as i32 {
            current_run += 1;
            max_run = max_run.max(current_run);
        } else {
            current_run = 0;
        }
    }

    let has_real_speech = percent_above_threshold > CLIP_PERCENT_GATE
        || rms > CLIP_RMS_GATE
        || peak_rms > CLIP_PEAK_GATE;

    VoiceActivityStats {
        rms,
        peak_rms,
        percent_above_threshold,
        max_consecutive_above_threshold: max_run,
        has_real_speech,
    }
}

/// Per-chunk analysis: `stats` carries the raw numbers, `is_speech` applies
/// the stricter chunk-level gate (used to decide whether to count this
/// chunk toward the clip's running totals at all).
pub struct ChunkAnalysis {
    pub stats: VoiceActivityStats,
    pub is_speech: bool,
}

/// Analyzes a single incoming chunk.
pub fn analyze_chunk(chunk: &[i16]) -> ChunkAnalysis {
    let stats = stats_over(chunk);
    let is_speech = stats.percent_above_threshold > CHUNK_PERCENT_GATE && stats.rms > CHUNK_RMS_GATE;
    ChunkAnalysis { stats, is_speech }
}

/// Analyzes a complete clip and decides whether it is worth transcribing.
///
/// Returns `(stats, should_transcribe)`. A clip under [`MIN_QUALIFYING_SECS`]
/// never qualifies, regardless of energy.
pub fn analyze_clip(clip: &AudioClip) -> (VoiceActivityStats, bool) {
    let stats = stats_over(&clip.samples);
    let should_transcribe = stats.has_real_speech && clip.duration_secs() >= MIN_QUALIFYING_SECS;
    (stats, should_transcribe)
}

/// Advances one smoothed level bar given the newest raw chunk RMS (0-100
/// scale expected by the overlay), using the configured exponential weight.
pub fn smooth_level(previous: f32, latest_rms: f32) -> f32 {
    previous * LEVEL_SMOOTHING_WEIGHT + latest_rms * (1.0 - LEVEL_SMOOTHING_WEIGHT)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn silence_has_no_speech() {
        let chunk = vec![0i16; 480];
        let analysis = analyze_chunk(&chunk);
        assert!(!analysis.is_speech);
        assert_eq!(analysis.stats.percent_above_threshold, 0.0);
    }

    #[test]
    fn loud_chunk_is_speech() {
        let chunk = vec![2000i16; 480];
        let analysis = analyze_chunk(&chunk);
        assert!(analysis.is_speech);
        assert!(analysis.stats.rms > CHUNK_RMS_GATE);
    }

    #[test]
    fn quiet_but_frequent_samples_do_not_pass_rms_gate() {
        // Every sample just over the above-threshold cutoff, but rms stays low.
        let chunk = vec![6i16; 480];
        let analysis = analyze_chunk(&chunk);
        assert!(analysis.stats.percent_above_threshold > CHUNK_PERCENT_GATE);
        assert!(analysis.stats.rms < CHUNK_RMS_GATE);
        assert!(!analysis.is_speech);
    }

    #[test]
    fn short_loud_clip_does_not_qualify() {
        let mut clip = AudioClip::new(16_000, Instant::now());
        clip.samples = vec![2000i16; 8_000]; // 0.5s
        let (_, should_transcribe) = analyze_clip(&clip);
        assert!(!should_transcribe, "below the 1.5s floor");
    }

    #[test]
    fn long_loud_clip_qualifies() {
        let mut clip = AudioClip::new(16_000, Instant::now());
        clip.samples = vec![2000i16; 16_000 * 2]; // 2s
        let (stats, should_transcribe) = analyze_clip(&clip);
        assert!(stats.has_real_speech);
        assert!(should_transcribe);
    }

    #[test]
    fn long_silent_clip_does_not_qualify() {
        let mut clip = AudioClip::new(16_000, Instant::now());
        clip.samples = vec![0i16; 16_000 * 2];
        let (stats, should_transcribe) = analyze_clip(&clip);
        assert!(!stats.has_real_speech);
        assert!(!should_transcribe);
    }

    #[test]
    fn empty_clip_has_default_stats() {
        let clip = AudioClip::new(16_000, Instant::now());
        let (stats, should_transcribe) = analyze_clip(&clip);
        assert_eq!(stats, VoiceActivityStats::default());
        assert!(!should_transcribe);
    }

    #[test]
    fn max_consecutive_tracks_longest_run() {
        let mut chunk = vec![0i16; 10];
        chunk[2] = 100;
        chunk[3] = 100;
        chunk[4] = 100;
        chunk[7] = 100;
        let analysis = analyze_chunk(&chunk);
        assert_eq!(analysis.stats.max_consecutive_above_threshold, 3);
    }

    #[test]
    fn smoothing_blends_previous_and_latest() {
        let next = smooth_level(0.0, 100.0);
        assert!((next - 80.0).abs() < 1e-5);
        let stable = smooth_level(50.0, 50.0);
        assert!((stable - 50.0).abs() < 1e-5);
    }
}
