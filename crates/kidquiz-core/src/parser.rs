//! TOML quiz file parser.
//!
//! Loads and saves quiz content, and validates it for authoring mistakes.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::{
    Question, QuizContent, DEFAULT_BACKGROUND, DEFAULT_TIMER_SECS, DEFAULT_TOPIC, OPTION_COUNT,
};

/// On-disk layout of a quiz file.
#[derive(Debug, Serialize, Deserialize)]
struct TomlQuizFile {
    #[serde(default)]
    quiz: TomlQuizHeader,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TomlQuizHeader {
    #[serde(default = "default_topic")]
    topic: String,
    #[serde(default = "default_background")]
    background: String,
    #[serde(default = "default_timer")]
    timer_secs: u32,
}

impl Default for TomlQuizHeader {
    fn default() -> Self {
        Self {
            topic: default_topic(),
            background: default_background(),
            timer_secs: default_timer(),
        }
    }
}

fn default_topic() -> String {
    DEFAULT_TOPIC.to_string()
}

fn default_background() -> String {
    DEFAULT_BACKGROUND.to_string()
}

fn default_timer() -> u32 {
    DEFAULT_TIMER_SECS
}

#[derive(Debug, Serialize, Deserialize)]
struct TomlQuestion {
    id: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    options: Vec<String>,
    #[serde(default)]
    correct: usize,
}

/// Parse a quiz file.
pub fn parse_quiz(path: &Path) -> Result<QuizContent> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read quiz file: {}", path.display()))?;

    parse_quiz_str(&content, path)
}

/// Parse quiz TOML from a string (useful for testing).
pub fn parse_quiz_str(content: &str, source_path: &Path) -> Result<QuizContent> {
    let parsed: TomlQuizFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let questions = parsed
        .questions
        .into_iter()
        .map(|q| Question {
            id: q.id,
            text: q.text,
            options: q.options,
            correct: q.correct,
        })
        .collect();

    Ok(QuizContent {
        topic: parsed.quiz.topic,
        background: parsed.quiz.background,
        timer_secs: parsed.quiz.timer_secs,
        questions,
    })
}

/// Render quiz content as TOML.
pub fn quiz_to_toml(quiz: &QuizContent) -> Result<String> {
    let file = TomlQuizFile {
        quiz: TomlQuizHeader {
            topic: quiz.topic.clone(),
            background: quiz.background.clone(),
            timer_secs: quiz.timer_secs,
        },
        questions: quiz
            .questions
            .iter()
            .map(|q| TomlQuestion {
                id: q.id.clone(),
                text: q.text.clone(),
                options: q.options.clone(),
                correct: q.correct,
            })
            .collect(),
    };
    toml::to_string_pretty(&file).context("failed to serialize quiz")
}

/// Write quiz content to a file, creating parent directories.
pub fn save_quiz(quiz: &QuizContent, path: &Path) -> Result<()> {
    let content = quiz_to_toml(quiz)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)
        .with_context(|| format!("failed to write quiz file: {}", path.display()))?;
    Ok(())
}

/// A warning from quiz validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<String>,
    /// Warning message.
    pub message: String,
}

impl ValidationWarning {
    fn question(id: &str, message: impl Into<String>) -> Self {
        Self {
            question_id: Some(id.to_string()),
            message: message.into(),
        }
    }
}

/// Validate quiz content for common authoring issues.
pub fn validate_quiz(quiz: &QuizContent) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if quiz.questions.is_empty() {
        warnings.push(ValidationWarning {
            question_id: None,
            message: "quiz has no questions".into(),
        });
    }

    if quiz.timer_secs == 0 {
        warnings.push(ValidationWarning {
            question_id: None,
            message: "timer_secs is 0; one second will be used".into(),
        });
    }

    if quiz.topic.trim().is_empty() {
        warnings.push(ValidationWarning {
            question_id: None,
            message: "topic is empty".into(),
        });
    }

    let mut seen_ids = HashSet::new();
    for q in &quiz.questions {
        if !seen_ids.insert(&q.id) {
            warnings.push(ValidationWarning::question(
                &q.id,
                format!("duplicate question ID: {}", q.id),
            ));
        }

        if q.text.trim().is_empty() {
            warnings.push(ValidationWarning::question(&q.id, "question text is empty"));
        }

        if q.options.len() != OPTION_COUNT {
            warnings.push(ValidationWarning::question(
                &q.id,
                format!("expected {OPTION_COUNT} options, found {}", q.options.len()),
            ));
        }

        let empty_options = q.options.iter().filter(|o| o.trim().is_empty()).count();
        if empty_options > 0 {
            warnings.push(ValidationWarning::question(
                &q.id,
                format!("{empty_options} empty option(s)"),
            ));
        }

        if q.correct >= q.options.len() {
            warnings.push(ValidationWarning::question(
                &q.id,
                format!(
                    "correct index {} is out of range for {} options",
                    q.correct,
                    q.options.len()
                ),
            ));
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
[quiz]
topic = "Đi bộ an toàn"
timer_secs = 15

[[questions]]
id = "walk-1"
text = "Khi đi bộ trên đường, em đi ở đâu?"
options = ["Giữa đường", "Trên vỉa hè", "Dưới lòng đường", "Chỗ nào cũng được"]
correct = 1
"#;

    #[test]
    fn parse_valid_toml() {
        let quiz = parse_quiz_str(VALID_TOML, &PathBuf::from("test.toml")).unwrap();
        assert_eq!(quiz.topic, "Đi bộ an toàn");
        assert_eq!(quiz.timer_secs, 15);
        assert_eq!(quiz.background, DEFAULT_BACKGROUND);
        assert_eq!(quiz.questions.len(), 1);
        assert_eq!(quiz.questions[0].id, "walk-1");
        assert_eq!(quiz.questions[0].correct, 1);
        assert!(validate_quiz(&quiz).is_empty());
    }

    #[test]
    fn parse_missing_header_uses_defaults() {
        let toml = r#"
[[questions]]
id = "q"
text = "?"
options = ["a", "b", "c", "d"]
"#;
        let quiz = parse_quiz_str(toml, &PathBuf::from("test.toml")).unwrap();
        assert_eq!(quiz.topic, DEFAULT_TOPIC);
        assert_eq!(quiz.timer_secs, DEFAULT_TIMER_SECS);
        assert_eq!(quiz.questions[0].correct, 0);
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        assert!(parse_quiz_str(bad, &PathBuf::from("bad.toml")).is_err());
    }

    #[test]
    fn validate_flags_authoring_mistakes() {
        let toml = r#"
[quiz]
topic = ""
timer_secs = 0

[[questions]]
id = "same"
text = ""
options = ["a", "", "c"]
correct = 5

[[questions]]
id = "same"
text = "ok"
options = ["a", "b", "c", "d"]
correct = 0
"#;
        let quiz = parse_quiz_str(toml, &PathBuf::from("test.toml")).unwrap();
        let warnings = validate_quiz(&quiz);
        let has = |needle: &str| warnings.iter().any(|w| w.message.contains(needle));
        assert!(has("duplicate"));
        assert!(has("question text is empty"));
        assert!(has("expected 4 options"));
        assert!(has("1 empty option"));
        assert!(has("out of range"));
        assert!(has("timer_secs is 0"));
        assert!(has("topic is empty"));
    }

    #[test]
    fn validate_empty_quiz() {
        let quiz = QuizContent {
            questions: vec![],
            ..Default::default()
        };
        let warnings = validate_quiz(&quiz);
        assert!(warnings.iter().any(|w| w.message.contains("no questions")));
    }

    #[test]
    fn save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quizzes").join("default.toml");
        let mut quiz = QuizContent::default();
        quiz.set_topic("Xe đạp");

        save_quiz(&quiz, &path).unwrap();
        let loaded = parse_quiz(&path).unwrap();
        assert_eq!(loaded, quiz);
    }

    #[test]
    fn missing_file_has_context() {
        let err = parse_quiz(Path::new("/nonexistent/quiz.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("failed to read quiz file"));
    }
}
