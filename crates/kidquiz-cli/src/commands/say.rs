//! The `kidquiz say` command.

use std::path::PathBuf;

use anyhow::Result;

use kidquiz_core::speech::Narration;
use kidquiz_providers::config::load_config_from;

use crate::narration::Voice;

pub async fn execute(text: String, config_path: Option<PathBuf>) -> Result<()> {
    anyhow::ensure!(!text.trim().is_empty(), "nothing to say");

    let config = load_config_from(config_path.as_deref())?;
    let voice = Voice::from_config(&config, false);

    match voice.say(&text).await {
        Some(Narration::Remote {
            cached,
            duration_ms,
        }) => eprintln!(
            "Remote voice, {:.1}s{}",
            duration_ms as f64 / 1000.0,
            if cached { " (cached)" } else { "" }
        ),
        Some(Narration::Local) => eprintln!("Device voice ({})", config.locale),
        Some(Narration::Superseded) | None => {}
    }

    voice.finish().await;
    Ok(())
}
