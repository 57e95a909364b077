//! Wiring of the speech synthesizer for terminal commands.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use kidquiz_core::speech::{Narration, SpeechCache, SpeechSynthesizer};
use kidquiz_providers::narrator::SystemNarrator;
use kidquiz_providers::player::RodioPlayer;
use kidquiz_providers::KidquizConfig;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// The voice of a terminal session, or silence.
pub struct Voice {
    synth: Option<SpeechSynthesizer>,
}

impl Voice {
    pub fn silent() -> Self {
        Self { synth: None }
    }

    /// Build from config. Remote synthesis is skipped when `offline` or when
    /// the provider cannot be created.
    pub fn from_config(config: &KidquizConfig, offline: bool) -> Self {
        let remote = if offline {
            None
        } else {
            config.build_speech_provider().unwrap_or_else(|e| {
                warn!("remote speech unavailable: {e:#}");
                None
            })
        };

        let synth = SpeechSynthesizer::new(
            remote,
            Arc::new(SystemNarrator::new()),
            Arc::new(RodioPlayer::new()),
            SpeechCache::new(),
            config.narration(),
        );
        Self { synth: Some(synth) }
    }

    pub async fn say(&self, text: &str) -> Option<Narration> {
        match &self.synth {
            Some(synth) => Some(synth.speak(text).await),
            None => None,
        }
    }

    pub fn stop(&self) {
        if let Some(synth) = &self.synth {
            synth.stop();
        }
    }

    /// Wait for the current narration to end.
    pub async fn finish(&self) {
        if let Some(synth) = &self.synth {
            while synth.is_speaking() {
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        }
    }
}
