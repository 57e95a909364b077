//! Decoding of synthesized speech into playable samples.
//!
//! Remote TTS returns raw PCM: 16-bit signed little-endian, 24000 Hz, mono,
//! wrapped in base64.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::QuizError;
use crate::traits::EncodedAudio;

/// Sample rate of synthesized speech.
pub const SAMPLE_RATE: u32 = 24_000;

/// Channel count of synthesized speech.
pub const CHANNELS: u16 = 1;

/// Decoded audio ready for playback. Samples are interleaved and in [-1, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct PcmBuffer {
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<f32>,
}

impl PcmBuffer {
    /// Decode 16-bit signed little-endian PCM bytes.
    pub fn from_pcm16_le(bytes: &[u8], sample_rate: u32, channels: u16) -> Result<Self, QuizError> {
        if bytes.len() % 2 != 0 {
            return Err(QuizError::AudioTruncated(bytes.len()));
        }
        let samples = bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
            .collect();
        Ok(Self {
            sample_rate,
            channels,
            samples,
        })
    }

    /// Decode a remote TTS payload with the fixed speech format.
    pub fn decode(audio: &EncodedAudio) -> Result<Self, QuizError> {
        let bytes = STANDARD
            .decode(audio.0.trim())
            .map_err(|e| QuizError::AudioEncoding(e.to_string()))?;
        Self::from_pcm16_le(&bytes, SAMPLE_RATE, CHANNELS)
    }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        self.frames() as u64 * 1000 / self.sample_rate as u64
    }
}
