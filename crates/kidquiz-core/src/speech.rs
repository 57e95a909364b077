//! Narration with graceful degradation.
//!
//! `speak` tries cached audio, then the remote TTS service, then the local
//! device voice. At most one narration is active: every call first cancels
//! the previous one. A generation counter keeps a superseded narration from
//! touching the state of the one that replaced it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::audio::PcmBuffer;
use crate::traits::{AudioPlayer, EncodedAudio, LocalNarrator, NarrationRequest, SpeechProvider};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

/// Synthesized audio keyed by the exact narrated text.
///
/// Entries are never evicted. Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct SpeechCache {
    entries: Arc<Mutex<HashMap<String, EncodedAudio>>>,
}

impl SpeechCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, text: &str) -> Option<EncodedAudio> {
        lock(&self.entries).get(text).cloned()
    }

    pub fn put(&self, text: &str, audio: EncodedAudio) {
        lock(&self.entries).insert(text.to_string(), audio);
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Local voice settings and the speaking-time estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct NarrationConfig {
    /// Target locale, e.g. "vi-VN".
    pub locale: String,
    /// Local speaking rate; slightly slow for young listeners.
    pub rate: f32,
    pub pitch: f32,
    /// Estimated local speaking time per character.
    pub ms_per_char: u64,
    /// Fixed padding added to the estimate.
    pub base_ms: u64,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            locale: "vi-VN".to_string(),
            rate: 0.9,
            pitch: 1.0,
            ms_per_char: 100,
            base_ms: 1000,
        }
    }
}

impl NarrationConfig {
    /// How long local speech of `text` is assumed to last.
    pub fn estimate(&self, text: &str) -> Duration {
        Duration::from_millis(text.chars().count() as u64 * self.ms_per_char + self.base_ms)
    }

    /// Primary language subtag of the locale ("vi-VN" → "vi").
    pub fn language(&self) -> String {
        self.locale
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_lowercase()
    }
}

// ---------------------------------------------------------------------------
// Synthesizer
// ---------------------------------------------------------------------------

/// Which path a `speak` call took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Narration {
    /// Remote audio is playing.
    Remote { cached: bool, duration_ms: u64 },
    /// The local device voice was asked to speak.
    Local,
    /// A newer `speak` or a `stop` arrived while fetching audio.
    Superseded,
}

#[derive(Debug, Default)]
struct NarrationState {
    generation: u64,
    speaking: bool,
}

impl NarrationState {
    /// Mark the narration of `generation` as done, unless it was replaced.
    fn finish(&mut self, generation: u64) {
        if self.generation == generation {
            self.speaking = false;
        }
    }
}

/// The device voice, shared with playback tasks that fall back to it.
struct LocalVoice {
    narrator: Arc<dyn LocalNarrator>,
    config: NarrationConfig,
    voice: OnceLock<Option<String>>,
}

impl LocalVoice {
    /// Hand `text` to the device and return how long it is assumed to last.
    fn speak(&self, text: &str) -> Duration {
        let request = NarrationRequest {
            text: text.to_string(),
            locale: self.config.locale.clone(),
            rate: self.config.rate,
            pitch: self.config.pitch,
            voice: self.voice().clone(),
        };
        match self.narrator.narrate(&request) {
            Ok(()) => info!(narrator = self.narrator.name(), "speaking with local voice"),
            Err(e) => warn!(narrator = self.narrator.name(), "local speech failed: {e:#}"),
        }
        self.config.estimate(text)
    }

    /// First device voice for the locale's language, looked up once.
    fn voice(&self) -> &Option<String> {
        self.voice.get_or_init(|| {
            let language = self.config.language();
            self.narrator
                .voices()
                .into_iter()
                .find(|v| v.language.to_lowercase().starts_with(&language))
                .map(|v| v.name)
        })
    }
}

/// Turns text into sound, remote first, local voice as fallback.
pub struct SpeechSynthesizer {
    remote: Option<Arc<dyn SpeechProvider>>,
    local: Arc<LocalVoice>,
    player: Arc<dyn AudioPlayer>,
    cache: SpeechCache,
    state: Arc<Mutex<NarrationState>>,
    active: Mutex<Option<JoinHandle<()>>>,
}

impl SpeechSynthesizer {
    pub fn new(
        remote: Option<Arc<dyn SpeechProvider>>,
        narrator: Arc<dyn LocalNarrator>,
        player: Arc<dyn AudioPlayer>,
        cache: SpeechCache,
        config: NarrationConfig,
    ) -> Self {
        Self {
            remote,
            local: Arc::new(LocalVoice {
                narrator,
                config,
                voice: OnceLock::new(),
            }),
            player,
            cache,
            state: Arc::new(Mutex::new(NarrationState::default())),
            active: Mutex::new(None),
        }
    }

    pub fn is_speaking(&self) -> bool {
        lock(&self.state).speaking
    }

    pub fn cache(&self) -> &SpeechCache {
        &self.cache
    }

    /// Narrate `text`, cancelling whatever was playing.
    ///
    /// If remote audio cannot be played, the playback task switches to the
    /// local voice.
    pub async fn speak(&self, text: &str) -> Narration {
        let generation = self.stop();

        let fetched = self.fetch(text).await;
        if lock(&self.state).generation != generation {
            debug!("narration superseded while fetching audio");
            return Narration::Superseded;
        }

        if let Some((audio, cached)) = fetched {
            match PcmBuffer::decode(&audio) {
                Ok(buffer) => {
                    if !cached {
                        self.cache.put(text, audio);
                    }
                    let duration_ms = buffer.duration_ms();
                    self.start_playback(text, buffer, generation);
                    return Narration::Remote {
                        cached,
                        duration_ms,
                    };
                }
                Err(e) => warn!("undecodable speech audio, using local voice: {e}"),
            }
        }

        self.speak_locally(text, generation);
        Narration::Local
    }

    /// Cancel remote playback and local speech. Returns the new generation.
    pub fn stop(&self) -> u64 {
        let generation = {
            let mut state = lock(&self.state);
            state.generation += 1;
            state.speaking = false;
            state.generation
        };
        if let Some(handle) = lock(&self.active).take() {
            handle.abort();
        }
        self.local.narrator.cancel();
        generation
    }

    async fn fetch(&self, text: &str) -> Option<(EncodedAudio, bool)> {
        if let Some(audio) = self.cache.get(text) {
            debug!("speech cache hit");
            return Some((audio, true));
        }

        let remote = self.remote.as_ref()?;
        match remote.synthesize(text).await {
            Ok(Some(audio)) if !audio.is_empty() => Some((audio, false)),
            Ok(_) => {
                warn!(
                    provider = remote.name(),
                    "remote speech returned no audio, using local voice"
                );
                None
            }
            Err(e) => {
                warn!(
                    provider = remote.name(),
                    "remote speech failed, using local voice: {e:#}"
                );
                None
            }
        }
    }

    fn start_playback(&self, text: &str, buffer: PcmBuffer, generation: u64) {
        lock(&self.state).speaking = true;

        let text = text.to_string();
        let player = Arc::clone(&self.player);
        let local = Arc::clone(&self.local);
        let state = Arc::clone(&self.state);
        let handle = tokio::spawn(async move {
            if let Err(e) = player.play(buffer).await {
                // Held while handing off so a concurrent stop cancels it.
                let estimate = {
                    let current = lock(&state);
                    if current.generation != generation {
                        return;
                    }
                    warn!("audio playback failed, using local voice: {e:#}");
                    local.speak(&text)
                };
                tokio::time::sleep(estimate).await;
            }
            lock(&state).finish(generation);
        });
        *lock(&self.active) = Some(handle);
    }

    fn speak_locally(&self, text: &str, generation: u64) {
        let estimate = self.local.speak(text);
        lock(&self.state).speaking = true;

        let state = Arc::clone(&self.state);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(estimate).await;
            lock(&state).finish(generation);
        });
        *lock(&self.active) = Some(handle);
    }
}

impl Drop for SpeechSynthesizer {
    fn drop(&mut self) {
        if let Some(handle) = lock(&self.active).take() {
            handle.abort();
        }
    }
}
