//! Cache-key fingerprinting and the cheap audio-signature dedup digest.
//!
//! Two distinct digests live here, matching §3's two `CacheEntry` kinds:
//! the compound `(fingerprint(audio), fingerprint(options))` cache key
//! (SHA-256-backed, collision-resistant) and the much cheaper
//! [`AudioSignature`] used only for opportunistic dedup of near-identical
//! clips. Grounded in the teacher's lack of any hashing primitive — this is
//! a new module, following `SinergaOptima-Dictum`'s use of `sha2` for
//! content hashing.

use sha2::{Digest, Sha256};

use crate::model::{AudioClip, TranscriptionOptions};

fn pcm_bytes(clip: &AudioClip) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(clip.samples.len() * 2);
    for &sample in &clip.samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    bytes
}

fn truncate_to_u64(digest: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(buf)
}

/// SHA-256 over the clip's raw PCM bytes, truncated to 64 bits.
pub fn fingerprint_audio(clip: &AudioClip) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(pcm_bytes(clip));
    truncate_to_u64(&hasher.finalize())
}

/// SHA-256 over a canonical encoding of the request options that affect the
/// provider's output, truncated to 64 bits.
pub fn fingerprint_options(opts: &TranscriptionOptions) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(opts.language.as_bytes());
    hasher.update(b"\0");
    hasher.update(opts.model.as_bytes());
    hasher.update(b"\0");
    hasher.update(opts.temperature.to_bits().to_le_bytes());
    hasher.update(b"\0");
    if let Some(prompt) = &opts.prompt {
        hasher.update(prompt.as_bytes());
    }
    truncate_to_u64(&hasher.finalize())
}

/// The compound cache key: `fingerprint(audio) ⊕ fingerprint(options)` (§3).
pub fn cache_key(clip: &AudioClip, opts: &TranscriptionOptions) -> u64 {
    fingerprint_audio(clip) ^ fingerprint_options(opts)
}

/// A cheap content digest: byte length plus every 10th byte of the first
/// 1,000 bytes of PCM data (§3). Used only for opportunistic dedup of
/// near-identical clips when request options are identical — not a
/// collision-resistant cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AudioSignature {
    pub byte_len: usize,
    pub sampled: Vec<u8>,
}

pub fn audio_signature(clip: &AudioClip) -> AudioSignature {
    let bytes = pcm_bytes(clip);
    let window = &bytes[..bytes.len().min(1_000)];
    let sampled = window.iter().step_by(10).copied().collect();
    AudioSignature {
        byte_len: bytes.len(),
        sampled,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
