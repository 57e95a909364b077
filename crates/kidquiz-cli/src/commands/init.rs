//! The `kidquiz init` command.

use std::path::Path;

use anyhow::Result;

use kidquiz_core::model::QuizContent;
use kidquiz_core::parser::save_quiz;
use kidquiz_providers::config::DEFAULT_CONFIG_TOML;

const CONFIG_FILE: &str = "kidquiz.toml";
const DEFAULT_QUIZ_FILE: &str = "quizzes/default.toml";

pub fn execute() -> Result<()> {
    if Path::new(CONFIG_FILE).exists() {
        println!("{CONFIG_FILE} already exists, skipping.");
    } else {
        std::fs::write(CONFIG_FILE, DEFAULT_CONFIG_TOML)?;
        println!("Created {CONFIG_FILE}");
    }

    let quiz_path = Path::new(DEFAULT_QUIZ_FILE);
    if quiz_path.exists() {
        println!("{DEFAULT_QUIZ_FILE} already exists, skipping.");
    } else {
        save_quiz(&QuizContent::default(), quiz_path)?;
        println!("Created {DEFAULT_QUIZ_FILE}");
    }

    println!("\nNext steps:");
    println!("  1. Put your Gemini key in GEMINI_API_KEY (or edit {CONFIG_FILE})");
    println!("  2. Run: kidquiz validate --quiz {DEFAULT_QUIZ_FILE}");
    println!("  3. Run: kidquiz play --quiz {DEFAULT_QUIZ_FILE}");

    Ok(())
}
