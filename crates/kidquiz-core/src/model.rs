//! Core data model types for kidquiz.
//!
//! Questions and the teacher's quiz content, plus the assessment tiers and
//! the result shown to the learner when a session finishes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of answer options every question is authored with.
pub const OPTION_COUNT: usize = 4;

/// Default countdown length in seconds.
pub const DEFAULT_TIMER_SECS: u32 = 10;

/// Topic used when the teacher has not set one.
pub const DEFAULT_TOPIC: &str = "An Toàn Giao Thông";

/// Background image used when the teacher has not set one.
pub const DEFAULT_BACKGROUND: &str =
    "https://lh3.googleusercontent.com/d/1340294zjPE2BQo0a7otcUy0QKaSOVt25";

/// A single multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Unique identifier within a quiz.
    pub id: String,
    /// The prompt shown to the learner.
    pub text: String,
    /// Answer options, labelled A, B, C, D in order.
    pub options: Vec<String>,
    /// Index of the correct option.
    pub correct: usize,
}

impl Question {
    pub fn new(id: &str, text: &str, options: [&str; OPTION_COUNT], correct: usize) -> Self {
        Self {
            id: id.to_string(),
            text: text.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            correct,
        }
    }

    /// An empty question as the editor creates it.
    pub fn blank(id: String) -> Self {
        Self {
            id,
            text: String::new(),
            options: vec![String::new(); OPTION_COUNT],
            correct: 0,
        }
    }

    pub fn is_correct(&self, index: usize) -> bool {
        index == self.correct
    }

    /// Letter label of the correct option.
    pub fn correct_letter(&self) -> char {
        option_letter(self.correct)
    }
}

/// Letter label for an option index (0 → 'A').
pub fn option_letter(index: usize) -> char {
    u32::try_from(index)
        .ok()
        .and_then(|i| ('A' as u32).checked_add(i))
        .and_then(char::from_u32)
        .unwrap_or('?')
}

/// Parse a letter label back into an option index ('b' → 1).
pub fn parse_option_letter(s: &str) -> Option<usize> {
    let mut chars = s.trim().chars();
    let c = chars.next()?.to_ascii_uppercase();
    if chars.next().is_some() || !c.is_ascii_uppercase() {
        return None;
    }
    Some(c as usize - 'A' as usize)
}

/// Everything the teacher configures: topic, background, timer, questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizContent {
    pub topic: String,
    pub background: String,
    pub timer_secs: u32,
    pub questions: Vec<Question>,
}

impl Default for QuizContent {
    fn default() -> Self {
        Self {
            topic: DEFAULT_TOPIC.to_string(),
            background: DEFAULT_BACKGROUND.to_string(),
            timer_secs: DEFAULT_TIMER_SECS,
            questions: default_questions(),
        }
    }
}

/// The built-in bicycle safety quiz.
pub fn default_questions() -> Vec<Question> {
    vec![
        Question::new(
            "1",
            "Xe đạp có những bộ phận nào cần kiểm tra trước khi đi?",
            [
                "Phanh, lốp, yên xe, đèn phản quang",
                "Mũ bảo hiểm, balo, áo mưa",
                "Ghi đông, tay lái, bàn đạp nhưng không cần phanh",
                "Chỉ cần bánh xe và ghi đông",
            ],
            0,
        ),
        Question::new(
            "2",
            "Khi đi xe đạp, em phải đi ở đâu để đảm bảo an toàn?",
            [
                "Bên trái đường",
                "Giữa lòng đường",
                "Bên phải, sát lề đường",
                "Đi chỗ nào cũng được",
            ],
            2,
        ),
        Question::new(
            "3",
            "Khi sang đường, em cần làm gì đầu tiên?",
            [
                "Đạp thật nhanh để qua đường",
                "Không cần nhìn xe vì đường vắng",
                "Quan sát hai bên và dắt xe qua nếu cần",
                "Gọi bạn đi cùng để qua nhanh",
            ],
            2,
        ),
        Question::new(
            "4",
            "Khi muốn rẽ trái hoặc rẽ phải, em phải làm gì?",
            [
                "Rẽ luôn, không cần báo hiệu",
                "Giơ tay xin đường trước khi rẽ",
                "Chạy nhanh để vượt kịp xe khác",
                "Bấm chuông thật to",
            ],
            1,
        ),
        Question::new(
            "5",
            "Hành vi nào sau đây là an toàn khi đi xe đạp?",
            [
                "Đi hàng ba cho vui",
                "Đua xe với bạn để xem ai nhanh hơn",
                "Đi sát lề phải và quan sát khi sang đường",
                "Vừa đi xe vừa nghịch điện thoại",
            ],
            2,
        ),
    ]
}

/// Performance tier, ordered from lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    #[serde(rename = "Chưa hoàn thành")]
    NotCompleted,
    #[serde(rename = "Hoàn thành")]
    Completed,
    #[serde(rename = "Hoàn thành tốt")]
    CompletedWell,
}

impl Tier {
    /// Tier for a score percentage in [0, 100].
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 80.0 {
            Tier::CompletedWell
        } else if percentage >= 50.0 {
            Tier::Completed
        } else {
            Tier::NotCompleted
        }
    }

    /// Tier for a finished session. `total` must be non-zero.
    pub fn from_score(score: u32, total: u32) -> Self {
        Self::from_percentage(percentage(score, total))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tier::CompletedWell => "Hoàn thành tốt",
            Tier::Completed => "Hoàn thành",
            Tier::NotCompleted => "Chưa hoàn thành",
        }
    }
}

/// Score as a percentage of total.
pub fn percentage(score: u32, total: u32) -> f64 {
    score as f64 / total as f64 * 100.0
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        [Tier::CompletedWell, Tier::Completed, Tier::NotCompleted]
            .into_iter()
            .find(|tier| tier.label().to_lowercase() == normalized)
            .ok_or_else(|| format!("unknown assessment level: {s}"))
    }
}

/// The assessment shown (and narrated) when a session finishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResult {
    /// Short cheerful line spoken by the mascot.
    pub message: String,
    /// Teacher-style written evaluation.
    pub teacher_comment: String,
    /// Performance tier.
    #[serde(rename = "assessmentLevel")]
    pub level: Tier,
    /// Reward symbol (an emoji).
    pub reward_emoji: String,
    /// Reward label.
    pub reward_name: String,
}

impl AssessmentResult {
    /// Text read aloud on the results screen.
    pub fn narration(&self) -> String {
        format!("{}. {}", self.message, self.teacher_comment)
    }
}
