//! The `kidquiz list` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use kidquiz_core::model::option_letter;
use kidquiz_core::parser::parse_quiz;

pub fn execute(quiz_path: PathBuf) -> Result<()> {
    let quiz = parse_quiz(&quiz_path)?;

    println!("{} ({} giây mỗi câu)", quiz.topic, quiz.timer_secs);
    println!("Background: {}", quiz.background);

    let mut table = Table::new();
    table.set_header(vec!["#", "ID", "Question", "Options", "Answer"]);

    for (i, q) in quiz.questions.iter().enumerate() {
        let options = q
            .options
            .iter()
            .enumerate()
            .map(|(j, o)| format!("{}. {o}", option_letter(j)))
            .collect::<Vec<_>>()
            .join("\n");
        let answer = if q.correct < q.options.len() {
            q.correct_letter().to_string()
        } else {
            "?".to_string()
        };
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&q.id),
            Cell::new(&q.text),
            Cell::new(options),
            Cell::new(answer),
        ]);
    }

    println!("{table}");
    Ok(())
}
