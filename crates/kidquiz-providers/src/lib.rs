//! kidquiz-providers: Remote services and device audio.
//!
//! Implements the core collaborator traits: Gemini for assessment and speech,
//! Ollama for offline-friendly assessment, the system speech engine as the
//! local narrator, and rodio for audio playback.

pub mod config;
pub mod error;
pub mod gemini;
pub mod mock;
pub mod narrator;
pub mod ollama;
pub mod player;

pub use config::{
    create_assessment_provider, create_speech_provider, KidquizConfig, ProviderConfig,
};
pub use error::ProviderError;
