//! The `kidquiz validate` command.

use std::path::PathBuf;

use anyhow::Result;

use kidquiz_core::parser::{parse_quiz, validate_quiz};

pub fn execute(quiz_path: PathBuf) -> Result<()> {
    let quiz = parse_quiz(&quiz_path)?;
    println!("Quiz: {} ({} questions)", quiz.topic, quiz.questions.len());

    let warnings = validate_quiz(&quiz);
    for w in &warnings {
        let prefix = w
            .question_id
            .as_ref()
            .map(|id| format!("  [{id}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("Quiz is valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
