//! Provider configuration and factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use kidquiz_core::speech::NarrationConfig;
use kidquiz_core::traits::{AssessmentProvider, SpeechProvider};

use crate::gemini::GeminiProvider;
use crate::ollama::{OllamaProvider, DEFAULT_MODEL as DEFAULT_OLLAMA_MODEL};

/// Environment variable that overrides the Gemini API key.
pub const GEMINI_KEY_ENV: &str = "KIDQUIZ_GEMINI_KEY";

/// Configuration for a single remote provider.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    Gemini {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
        /// Model for assessment text.
        #[serde(default)]
        model: Option<String>,
        #[serde(default)]
        tts_model: Option<String>,
        /// Prebuilt voice name.
        #[serde(default)]
        voice: Option<String>,
    },
    Ollama {
        #[serde(default = "default_ollama_url")]
        base_url: String,
        #[serde(default = "default_ollama_model")]
        model: String,
    },
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::Gemini {
                api_key: _,
                base_url,
                model,
                tts_model,
                voice,
            } => f
                .debug_struct("Gemini")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .field("model", model)
                .field("tts_model", tts_model)
                .field("voice", voice)
                .finish(),
            ProviderConfig::Ollama { base_url, model } => f
                .debug_struct("Ollama")
                .field("base_url", base_url)
                .field("model", model)
                .finish(),
        }
    }
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    DEFAULT_OLLAMA_MODEL.to_string()
}

/// Top-level kidquiz configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KidquizConfig {
    /// Provider configurations keyed by name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// Provider that writes the end-of-quiz assessment.
    #[serde(default = "default_provider")]
    pub assessment_provider: String,
    /// Provider that synthesizes narration.
    #[serde(default = "default_provider")]
    pub speech_provider: String,
    /// Locale for local speech.
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default = "default_speech_rate")]
    pub speech_rate: f32,
    #[serde(default = "default_speech_pitch")]
    pub speech_pitch: f32,
    /// Overrides the quiz file's own countdown when set.
    #[serde(default)]
    pub timer_secs: Option<u32>,
    /// Minimum time the assessment takes to appear.
    #[serde(default = "default_review_delay")]
    pub min_review_delay_ms: u64,
}

fn default_provider() -> String {
    "gemini".to_string()
}
fn default_locale() -> String {
    "vi-VN".to_string()
}
fn default_speech_rate() -> f32 {
    0.9
}
fn default_speech_pitch() -> f32 {
    1.0
}
fn default_review_delay() -> u64 {
    2000
}

impl Default for KidquizConfig {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            assessment_provider: default_provider(),
            speech_provider: default_provider(),
            locale: default_locale(),
            speech_rate: default_speech_rate(),
            speech_pitch: default_speech_pitch(),
            timer_secs: None,
            min_review_delay_ms: default_review_delay(),
        }
    }
}

impl KidquizConfig {
    /// Settings for local narration.
    pub fn narration(&self) -> NarrationConfig {
        NarrationConfig {
            locale: self.locale.clone(),
            rate: self.speech_rate,
            pitch: self.speech_pitch,
            ..Default::default()
        }
    }

    pub fn min_review_delay(&self) -> Duration {
        Duration::from_millis(self.min_review_delay_ms)
    }

    /// The configured assessment provider, or `None` when it is not set up.
    pub fn build_assessment_provider(&self) -> Result<Option<Arc<dyn AssessmentProvider>>> {
        match self.providers.get(&self.assessment_provider) {
            Some(config) => create_assessment_provider(&self.assessment_provider, config).map(Some),
            None => {
                info!(
                    provider = %self.assessment_provider,
                    "assessment provider not configured, using local pool only"
                );
                Ok(None)
            }
        }
    }

    /// The configured speech provider, or `None` when it is not set up.
    pub fn build_speech_provider(&self) -> Result<Option<Arc<dyn SpeechProvider>>> {
        match self.providers.get(&self.speech_provider) {
            Some(config) => create_speech_provider(&self.speech_provider, config).map(Some),
            None => {
                info!(
                    provider = %self.speech_provider,
                    "speech provider not configured, using device speech only"
                );
                Ok(None)
            }
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 2..start + end];
        // Substituted values are not scanned again.
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

fn resolve_opt(value: &Option<String>) -> Option<String> {
    value.as_deref().map(resolve_env_vars)
}

/// Resolve env vars in a provider config.
fn resolve_provider_config(config: &ProviderConfig) -> ProviderConfig {
    match config {
        ProviderConfig::Gemini {
            api_key,
            base_url,
            model,
            tts_model,
            voice,
        } => ProviderConfig::Gemini {
            api_key: resolve_env_vars(api_key),
            base_url: resolve_opt(base_url),
            model: resolve_opt(model),
            tts_model: resolve_opt(tts_model),
            voice: resolve_opt(voice),
        },
        ProviderConfig::Ollama { base_url, model } => ProviderConfig::Ollama {
            base_url: resolve_env_vars(base_url),
            model: resolve_env_vars(model),
        },
    }
}

/// Load config from an explicit path, or search the default locations.
///
/// Search order without a path:
/// 1. `kidquiz.toml` in the current directory
/// 2. `~/.config/kidquiz/config.toml`
///
/// Environment variable override: `KIDQUIZ_GEMINI_KEY`.
pub fn load_config_from(path: Option<&Path>) -> Result<KidquizConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("kidquiz.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => KidquizConfig::default(),
    };

    if let Ok(key) = std::env::var(GEMINI_KEY_ENV) {
        let entry = config
            .providers
            .entry("gemini".into())
            .or_insert(ProviderConfig::Gemini {
                api_key: String::new(),
                base_url: None,
                model: None,
                tts_model: None,
                voice: None,
            });
        if let ProviderConfig::Gemini { api_key, .. } = entry {
            *api_key = key;
        }
    }

    config.providers = config
        .providers
        .iter()
        .map(|(k, v)| (k.clone(), resolve_provider_config(v)))
        .collect();

    Ok(config)
}

/// Parse configuration TOML.
pub fn parse_config(content: &str) -> Result<KidquizConfig> {
    Ok(toml::from_str::<KidquizConfig>(content)?)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("kidquiz"))
}

/// Create an assessment provider from its configuration.
pub fn create_assessment_provider(
    name: &str,
    config: &ProviderConfig,
) -> Result<Arc<dyn AssessmentProvider>> {
    match config {
        ProviderConfig::Gemini {
            api_key,
            base_url,
            model,
            ..
        } => {
            ensure_key(name, api_key)?;
            let provider =
                GeminiProvider::new(api_key, base_url.clone())?.with_text_model(model.clone());
            Ok(Arc::new(provider))
        }
        ProviderConfig::Ollama { base_url, model } => {
            Ok(Arc::new(OllamaProvider::new(base_url, model)?))
        }
    }
}

/// Create a speech provider from its configuration.
pub fn create_speech_provider(
    name: &str,
    config: &ProviderConfig,
) -> Result<Arc<dyn SpeechProvider>> {
    match config {
        ProviderConfig::Gemini {
            api_key,
            base_url,
            tts_model,
            voice,
            ..
        } => {
            ensure_key(name, api_key)?;
            let provider = GeminiProvider::new(api_key, base_url.clone())?
                .with_tts_model(tts_model.clone())
                .with_voice(voice.clone());
            Ok(Arc::new(provider))
        }
        ProviderConfig::Ollama { .. } => {
            anyhow::bail!("provider '{name}' (ollama) cannot synthesize speech")
        }
    }
}

fn ensure_key(name: &str, api_key: &str) -> Result<()> {
    if api_key.trim().is_empty() {
        anyhow::bail!("provider '{name}' has no API key; set api_key or {GEMINI_KEY_ENV}");
    }
    Ok(())
}

/// Starter configuration written by `kidquiz init`.
pub const DEFAULT_CONFIG_TOML: &str = r#"# kidquiz configuration

assessment_provider = "gemini"
speech_provider = "gemini"
locale = "vi-VN"
speech_rate = 0.9
speech_pitch = 1.0
min_review_delay_ms = 2000

[providers.gemini]
type = "gemini"
api_key = "${GEMINI_API_KEY}"

[providers.ollama]
type = "ollama"
base_url = "http://localhost:11434"
model = "llama3.1"
"#;
