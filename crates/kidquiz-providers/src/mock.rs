//! Mock providers for testing sessions without network or sound hardware.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use kidquiz_core::audio::PcmBuffer;
use kidquiz_core::traits::{
    AssessmentProvider, AssessmentRequest, AudioPlayer, EncodedAudio, LocalNarrator,
    NarrationRequest, RemoteAssessment, SpeechProvider, VoiceInfo,
};

/// A mock assessment generator that returns a fixed reply or always fails.
pub struct MockAssessmentProvider {
    reply: Option<RemoteAssessment>,
    call_count: AtomicU32,
    last_request: Mutex<Option<AssessmentRequest>>,
}

impl MockAssessmentProvider {
    /// Create a mock that always returns `reply`.
    pub fn with_fixed_response(reply: RemoteAssessment) -> Self {
        Self {
            reply: Some(reply),
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Create a mock whose every call fails like an exhausted quota.
    pub fn failing() -> Self {
        Self {
            reply: None,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Get the number of calls made to this provider.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get the last request made to this provider.
    pub fn last_request(&self) -> Option<AssessmentRequest> {
        self.last_request
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }
}

#[async_trait]
impl AssessmentProvider for MockAssessmentProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn assess(&self, request: &AssessmentRequest) -> anyhow::Result<RemoteAssessment> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self.last_request.lock().unwrap_or_else(|p| p.into_inner()) = Some(request.clone());

        match &self.reply {
            Some(reply) => Ok(reply.clone()),
            None => Err(crate::ProviderError::RateLimited {
                retry_after_ms: 30_000,
            }
            .into()),
        }
    }
}

/// A mock speech synthesizer that counts calls.
pub struct MockSpeechProvider {
    audio: Option<EncodedAudio>,
    fail: bool,
    call_count: AtomicU32,
}

impl MockSpeechProvider {
    /// Always answer with `audio`.
    pub fn with_audio(audio: EncodedAudio) -> Self {
        Self {
            audio: Some(audio),
            fail: false,
            call_count: AtomicU32::new(0),
        }
    }

    /// Answer successfully but without any audio.
    pub fn silent() -> Self {
        Self {
            audio: None,
            fail: false,
            call_count: AtomicU32::new(0),
        }
    }

    /// Fail every call.
    pub fn failing() -> Self {
        Self {
            audio: None,
            fail: true,
            call_count: AtomicU32::new(0),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl SpeechProvider for MockSpeechProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn synthesize(&self, _text: &str) -> anyhow::Result<Option<EncodedAudio>> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if self.fail {
            anyhow::bail!(crate::ProviderError::NetworkError("connection reset".into()));
        }
        Ok(self.audio.clone())
    }
}

/// A narrator that records what it was asked to say.
#[derive(Default)]
pub struct RecordingNarrator {
    voices: Vec<VoiceInfo>,
    spoken: Mutex<Vec<NarrationRequest>>,
    cancels: AtomicU32,
}

impl RecordingNarrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_voices(voices: Vec<VoiceInfo>) -> Self {
        Self {
            voices,
            ..Self::default()
        }
    }

    /// Every request received, oldest first.
    pub fn spoken(&self) -> Vec<NarrationRequest> {
        self.spoken
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    pub fn cancel_count(&self) -> u32 {
        self.cancels.load(Ordering::Relaxed)
    }
}

impl LocalNarrator for RecordingNarrator {
    fn name(&self) -> &str {
        "recording"
    }

    fn voices(&self) -> Vec<VoiceInfo> {
        self.voices.clone()
    }

    fn narrate(&self, request: &NarrationRequest) -> anyhow::Result<()> {
        self.spoken
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(request.clone());
        Ok(())
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::Relaxed);
    }
}

/// A player that finishes immediately.
#[derive(Default)]
pub struct InstantPlayer {
    played: AtomicU32,
}

impl InstantPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn play_count(&self) -> u32 {
        self.played.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl AudioPlayer for InstantPlayer {
    async fn play(&self, _buffer: PcmBuffer) -> anyhow::Result<()> {
        self.played.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> AssessmentRequest {
        AssessmentRequest {
            topic: "An Toàn Giao Thông".into(),
            score: 3,
            total: 5,
        }
    }

    #[tokio::test]
    async fn fixed_assessment() {
        let provider = MockAssessmentProvider::with_fixed_response(RemoteAssessment {
            message: Some("Giỏi lắm!".into()),
            ..Default::default()
        });

        let reply = provider.assess(&request()).await.unwrap();
        assert_eq!(reply.message.as_deref(), Some("Giỏi lắm!"));
        assert_eq!(provider.call_count(), 1);
        assert_eq!(provider.last_request().unwrap().score, 3);
    }

    #[tokio::test]
    async fn failing_assessment() {
        let provider = MockAssessmentProvider::failing();
        let err = provider.assess(&request()).await.unwrap_err();
        assert!(err.to_string().contains("rate limited"));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn speech_variants() {
        let audio = MockSpeechProvider::with_audio(EncodedAudio("AAAA".into()));
        assert!(audio.synthesize("a").await.unwrap().is_some());

        let silent = MockSpeechProvider::silent();
        assert!(silent.synthesize("a").await.unwrap().is_none());

        let failing = MockSpeechProvider::failing();
        assert!(failing.synthesize("a").await.is_err());
        assert!(failing.synthesize("a").await.is_err());
        assert_eq!(failing.call_count(), 2);
    }

    #[test]
    fn narrator_records() {
        let narrator = RecordingNarrator::new();
        narrator
            .narrate(&NarrationRequest {
                text: "Xin chào".into(),
                locale: "vi-VN".into(),
                rate: 0.9,
                pitch: 1.0,
                voice: None,
            })
            .unwrap();
        narrator.cancel();
        assert_eq!(narrator.spoken().len(), 1);
        assert_eq!(narrator.cancel_count(), 1);
    }
}
