//! Audio pipeline — microphone capture → resampling → ring buffer → voice-activity analysis → WAV encoding.
//!
//! # Pipeline
//!
//! ```text
//! Microphone → cpal callback → AudioChunk (mpsc) → resample_to_16k
//!           → stereo_to_mono → RingBuffer → vad::analyze_chunk → wav::encode
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::mpsc;
//! use juno_dictation::audio::{AudioCapture, AudioChunk};
//!
//! let (tx, rx) = mpsc::channel::<AudioChunk>();
//! let capture = AudioCapture::new().unwrap();
//! let _handle = capture.start(tx).unwrap(); // drops handle → stops stream
//!
//! while let Ok(chunk) = rx.recv() {
//!     println!("received {} samples @ {}Hz", chunk.samples.len(), chunk.sample_rate);
//! }
//! ```

pub mod buffer;
pub mod capture;
pub mod resample;
pub mod vad;
pub mod wav;

pub use buffer::RingBuffer;
pub use capture::{AudioCapture, AudioChunk, StreamHandle};
pub use resample::{resample_to_16k, stereo_to_mono};
pub use vad::{analyze_chunk, analyze_clip, smooth_level, ChunkAnalysis};
pub use wav::{decode as wav_decode, encode as wav_encode, encode_streaming as wav_encode_streaming};
