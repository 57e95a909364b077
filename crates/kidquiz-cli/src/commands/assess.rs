//! The `kidquiz assess` command.

use std::path::PathBuf;

use anyhow::Result;
use tracing::warn;

use kidquiz_core::assessment::AssessmentGenerator;
use kidquiz_core::model::DEFAULT_TOPIC;
use kidquiz_providers::config::load_config_from;

use super::play::print_assessment;

pub async fn execute(
    score: u32,
    total: u32,
    topic: Option<String>,
    offline: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(total > 0, "total must be at least 1");
    anyhow::ensure!(score <= total, "score {score} is greater than total {total}");

    let config = load_config_from(config_path.as_deref())?;
    let remote = if offline {
        None
    } else {
        config.build_assessment_provider().unwrap_or_else(|e| {
            warn!("remote assessment unavailable: {e:#}");
            None
        })
    };

    let topic = topic.unwrap_or_else(|| DEFAULT_TOPIC.to_string());
    let generator = AssessmentGenerator::new(remote).with_min_delay(config.min_review_delay());
    let result = generator.assess(score, total, &topic).await;

    println!("{topic}: {score}/{total}");
    print_assessment(&result);
    Ok(())
}
