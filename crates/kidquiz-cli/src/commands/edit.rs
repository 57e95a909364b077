//! Quiz editing commands: `add-question`, `remove-question`, `set-topic`, `set-background`.

use std::path::PathBuf;

use anyhow::{Context, Result};

use kidquiz_core::model::{parse_option_letter, OPTION_COUNT};
use kidquiz_core::parser::{parse_quiz, save_quiz};

/// Accept "B", "b", or a 0-based index such as "1".
fn parse_correct(value: &str) -> Result<usize> {
    parse_option_letter(value)
        .or_else(|| value.trim().parse::<usize>().ok())
        .with_context(|| format!("invalid correct answer '{value}'; use A-D or 0-3"))
}

pub fn add_question(
    quiz_path: PathBuf,
    text: String,
    options: Vec<String>,
    correct: String,
) -> Result<()> {
    anyhow::ensure!(
        options.len() == OPTION_COUNT,
        "expected {OPTION_COUNT} --option values, got {}",
        options.len()
    );
    let correct = parse_correct(&correct)?;

    let mut quiz = parse_quiz(&quiz_path)?;
    let id = quiz.add_blank_question();
    quiz.set_question_text(&id, &text)?;
    for (i, option) in options.iter().enumerate() {
        quiz.set_option(&id, i, option)?;
    }
    quiz.set_correct(&id, correct)?;
    save_quiz(&quiz, &quiz_path)?;

    println!("Added question {id} ({} total)", quiz.questions.len());
    Ok(())
}

pub fn remove_question(quiz_path: PathBuf, id: String) -> Result<()> {
    let mut quiz = parse_quiz(&quiz_path)?;
    let removed = quiz.remove_question(&id)?;
    save_quiz(&quiz, &quiz_path)?;

    println!(
        "Removed question {}: {} ({} left)",
        removed.id,
        removed.text,
        quiz.questions.len()
    );
    Ok(())
}

pub fn set_topic(quiz_path: PathBuf, topic: String) -> Result<()> {
    if topic.trim().is_empty() {
        anyhow::bail!("topic must not be empty");
    }
    let mut quiz = parse_quiz(&quiz_path)?;
    quiz.set_topic(&topic);
    save_quiz(&quiz, &quiz_path)?;

    println!("Topic: {}", quiz.topic);
    Ok(())
}

pub fn set_background(quiz_path: PathBuf, url: String) -> Result<()> {
    let mut quiz = parse_quiz(&quiz_path)?;
    quiz.set_background(&url);
    save_quiz(&quiz, &quiz_path)?;

    println!("Background: {}", quiz.background);
    Ok(())
}
