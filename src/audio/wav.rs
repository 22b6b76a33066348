//! Hand-rolled PCM ↔ WAV codec.
//!
//! The Transcription Orchestrator hands the provider a plain 44-byte-header
//! RIFF/WAVE file (mono, 16-bit signed PCM). No third-party WAV crate is
//! used — the format is small and fully specified, in the same
//! manual-buffer style as [`super::buffer::RingBuffer`].

use std::io::{self, Write};

const HEADER_LEN: u32 = 44;
const FMT_CHUNK_LEN: u32 = 16;
const PCM_FORMAT_TAG: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;

/// Encodes mono 16-bit PCM `samples` at `sample_rate` Hz into a WAV byte buffer.
pub fn encode(samples: &[i16], sample_rate: u32) -> Vec<u8> {
    let data_len = (samples.len() * 2) as u32;
    let block_align = (BITS_PER_SAMPLE / 8) as u32;
    let byte_rate = sample_rate * block_align;

    let mut buf = Vec::with_capacity(HEADER_LEN as usize + data_len as usize);

    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&(36 + data_len).to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&FMT_CHUNK_LEN.to_le_bytes());
    buf.extend_from_slice(&PCM_FORMAT_TAG.to_le_bytes());
    buf.extend_from_slice(&1u16.to_le_bytes()); // mono
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&(block_align as u16).to_le_bytes());
    buf.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_len.to_le_bytes());
    for &sample in samples {
        buf.extend_from_slice(&sample.to_le_bytes());
    }

    buf
}

/// Writes the WAV encoding of `samples` directly to `writer`, for clips long
/// enough that buffering the whole file in memory first is wasteful.
pub fn encode_streaming<W: Write>(mut writer: W, samples: &[i16], sample_rate: u32) -> io::Result<()> {
    let data_len = (samples.len() * 2) as u32;
    let block_align = (BITS_PER_SAMPLE / 8) as u32;
    let byte_rate = sample_rate * block_align;

    writer.write_all(b"RIFF")?;
    writer.write_all(&(36 + data_len).to_le_bytes())?;
    writer.write_all(b"WAVE")?;

    writer.write_all(b"fmt ")?;
    writer.write_all(&FMT_CHUNK_LEN.to_le_bytes())?;
    writer.write_all(&PCM_FORMAT_TAG.to_le_bytes())?;
    writer.write_all(&1u16.to_le_bytes())?;
    writer.write_all(&sample_rate.to_le_bytes())?;
    writer.write_all(&byte_rate.to_le_bytes())?;
    writer.write_all(&(block_align as u16).to_le_bytes())?;
    writer.write_all(&BITS_PER_SAMPLE.to_le_bytes())?;

    writer.write_all(b"data")?;
    writer.write_all(&data_len.to_le_bytes())?;
    for &sample in samples {
        writer.write_all(&sample.to_le_bytes())?;
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum WavDecodeError {
    #[error("buffer too short to contain a WAV header")]
    Truncated,
    #[error("missing RIFF/WAVE magic")]
    BadMagic,
    #[error("unsupported format: only mono 16-bit PCM is accepted")]
    UnsupportedFormat,
}

/// Decodes a WAV byte buffer produced by [`encode`] back into samples and
/// sample rate. Only the mono/16-bit-PCM shape this codec writes is
/// accepted — round-tripping is the only supported use.
pub fn decode(bytes: &[u8]) -> Result<(Vec<i16>, u32), WavDecodeError> {
    if bytes.len() < HEADER_LEN as usize {
        return Err(WavDecodeError::Truncated);
    }
    if &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return Err(WavDecodeError::BadMagic);
    }
    if &bytes[12..16] != b"fmt " {
        return Err(WavDecodeError::UnsupportedFormat);
    }

    let channels = u16::from_le_bytes([bytes[22], bytes[23]]);
    let sample_rate = u32::from_le_bytes([bytes[24], bytes[25], bytes[26], bytes[27]]);
    let bits_per_sample = u16::from_le_bytes([bytes[34], bytes[35]]);
    if channels != 1 || bits_per_sample != BITS_PER_SAMPLE {
        return Err(WavDecodeError::UnsupportedFormat);
    }
    if &bytes[36..40] != b"data" {
        return Err(WavDecodeError::UnsupportedFormat);
    }

    let data_len = u32::from_le_bytes([bytes[40], bytes[41], bytes[42], bytes[43]]) as usize;
    let data = &bytes[44..];
    let available = data.len().min(data_len);

    let samples = data[..available]
        .chunks_exact(2)
        .map(|c| i16::from_le_bytes([c[0], c[1]]))
        .collect();

    Ok((samples, sample_rate))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_samples_and_sample_rate() {
        let samples: Vec<i16> = (0..16_000).map(|i| (i % 300 - 150) as i16).collect();
        let encoded = encode(&samples, 16_000);
        let (decoded, rate) = decode(&encoded).expect("decode");
        assert_eq!(decoded, samples);
        assert_eq!(rate, 16_000);
    }

    #[test]
    fn empty_samples_round_trip() {
        let encoded = encode(&[], 16_000);
        let (decoded, rate) = decode(&encoded).expect("decode");
        assert!(decoded.is_empty());
        assert_eq!(rate, 16_000);
    }

    #[test]
    fn header_is_exactly_44_bytes() {
        let encoded = encode(&[1, 2, 3], 16_000);
        assert_eq!(encoded.len(), 44 + 3 * 2);
    }

    #[test]
    fn streaming_matches_buffered() {
        let samples: Vec<i16> = (0..1000).map(|i| i as i16).collect();
        let buffered = encode(&samples, 16_000);
        let mut streamed = Vec::new();
        encode_streaming(&mut streamed, &samples, 16_000).expect("encode");
        assert_eq!(buffered, streamed);
    }

    #[test]
    fn rejects_truncated_input() {
        assert!(matches!(decode(&[1, 2, 3]), Err(WavDecodeError::Truncated)));
    }

    #[test]
    fn rejects_bad_magic() {
        let mut encoded = encode(&[1, 2, 3], 16_000);
        encoded[0] = b'X';
        assert!(matches!(decode(&encoded), Err(WavDecodeError::BadMagic)));
    }
}
