//! Audio playback on the default output device through rodio.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStreamBuilder, Sink};
use tracing::{debug, instrument};

use kidquiz_core::audio::PcmBuffer;
use kidquiz_core::traits::AudioPlayer;

use crate::error::ProviderError;

/// The sink of one `play` call, stopped when the call is abandoned.
#[derive(Default)]
struct Playback {
    sink: Option<Arc<Sink>>,
    cancelled: bool,
}

#[derive(Default, Clone)]
struct PlaybackSlot(Arc<Mutex<Playback>>);

impl PlaybackSlot {
    fn lock(&self) -> MutexGuard<'_, Playback> {
        self.0.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Register the sink. Returns false if playback was already cancelled.
    fn install(&self, sink: Arc<Sink>) -> bool {
        let mut playback = self.lock();
        if playback.cancelled {
            return false;
        }
        playback.sink = Some(sink);
        true
    }

    fn cancel(&self) {
        let mut playback = self.lock();
        playback.cancelled = true;
        if let Some(sink) = playback.sink.take() {
            sink.stop();
        }
    }
}

/// Stops the sink when the `play` future is dropped.
struct StopOnDrop(PlaybackSlot);

impl Drop for StopOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

/// Plays decoded speech on the default output device.
///
/// Each call opens the device, so a device that appears later is picked up.
/// Dropping the `play` future stops the sound.
#[derive(Debug, Default, Clone)]
pub struct RodioPlayer;

impl RodioPlayer {
    pub fn new() -> Self {
        Self
    }
}

fn play_blocking(buffer: PcmBuffer, slot: &PlaybackSlot) -> Result<(), ProviderError> {
    let stream = OutputStreamBuilder::open_default_stream()
        .map_err(|e| ProviderError::AudioDevice(e.to_string()))?;

    let sink = Arc::new(Sink::connect_new(stream.mixer()));
    sink.append(SamplesBuffer::new(
        buffer.channels,
        buffer.sample_rate,
        buffer.samples,
    ));
    if !slot.install(Arc::clone(&sink)) {
        debug!("playback cancelled before it started");
        return Ok(());
    }
    sink.sleep_until_end();
    Ok(())
}

#[async_trait]
impl AudioPlayer for RodioPlayer {
    #[instrument(skip(self, buffer), fields(ms = buffer.duration_ms()))]
    async fn play(&self, buffer: PcmBuffer) -> anyhow::Result<()> {
        let slot = PlaybackSlot::default();
        let _guard = StopOnDrop(slot.clone());

        tokio::task::spawn_blocking(move || play_blocking(buffer, &slot))
            .await
            .map_err(|e| ProviderError::AudioDevice(format!("playback task failed: {e}")))??;
        Ok(())
    }
}
