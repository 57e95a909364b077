//! Session report with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{percentage, AssessmentResult, Question};
use crate::session::{QuestionOutcome, QuizSession};

/// Outcome of one question, with the question it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub question_id: String,
    pub text: String,
    #[serde(flatten)]
    pub outcome: QuestionOutcome,
}

/// Summary of a finished play-through, written for the teacher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the session finished.
    pub finished_at: DateTime<Utc>,
    pub topic: String,
    pub score: u32,
    pub total: u32,
    pub questions: Vec<QuestionRecord>,
    pub assessment: AssessmentResult,
}

impl SessionReport {
    /// Build a report from a session and its assessment.
    ///
    /// Questions the session never reached are left out.
    pub fn from_session(
        session: &QuizSession<'_>,
        questions: &[Question],
        topic: &str,
        assessment: AssessmentResult,
    ) -> Self {
        let records = questions
            .iter()
            .zip(session.outcomes())
            .map(|(q, outcome)| QuestionRecord {
                question_id: q.id.clone(),
                text: q.text.clone(),
                outcome: *outcome,
            })
            .collect();

        Self {
            id: Uuid::new_v4(),
            finished_at: Utc::now(),
            topic: topic.to_string(),
            score: session.score(),
            total: session.total(),
            questions: records,
            assessment,
        }
    }

    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        percentage(self.score, self.total)
    }

    pub fn timed_out_count(&self) -> usize {
        self.questions
            .iter()
            .filter(|r| r.outcome == QuestionOutcome::TimedOut)
            .count()
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        serde_json::from_str(&content).context("failed to parse report JSON")
    }
}
