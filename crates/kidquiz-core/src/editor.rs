//! Teacher-side editing of quiz content.
//!
//! Edits only preserve structural shape; empty texts and options are
//! allowed through and reported by [`crate::parser::validate_quiz`].

use uuid::Uuid;

use crate::error::QuizError;
use crate::model::{Question, QuizContent};

const DRIVE_HOST: &str = "drive.google.com";
const DRIVE_IMAGE_BASE: &str = "https://lh3.googleusercontent.com/d/";

/// Turn a Google Drive share link into a direct image link.
///
/// Other URLs are returned unchanged.
pub fn sanitize_background_url(url: &str) -> String {
    let url = url.trim();
    if !url.contains(DRIVE_HOST) {
        return url.to_string();
    }
    let Some(start) = url.find("/d/").map(|i| i + 3) else {
        return url.to_string();
    };
    let id: String = url[start..]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    if id.is_empty() {
        url.to_string()
    } else {
        format!("{DRIVE_IMAGE_BASE}{id}")
    }
}

impl QuizContent {
    pub fn set_topic(&mut self, topic: &str) {
        self.topic = topic.trim().to_string();
    }

    pub fn set_background(&mut self, url: &str) {
        self.background = sanitize_background_url(url);
    }

    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    fn question_mut(&mut self, id: &str) -> Result<&mut Question, QuizError> {
        self.questions
            .iter_mut()
            .find(|q| q.id == id)
            .ok_or_else(|| QuizError::QuestionNotFound(id.to_string()))
    }

    pub fn set_question_text(&mut self, id: &str, text: &str) -> Result<(), QuizError> {
        self.question_mut(id)?.text = text.to_string();
        Ok(())
    }

    pub fn set_option(&mut self, id: &str, index: usize, text: &str) -> Result<(), QuizError> {
        let question = self.question_mut(id)?;
        let count = question.options.len();
        let option = question
            .options
            .get_mut(index)
            .ok_or(QuizError::OptionOutOfRange { index, count })?;
        *option = text.to_string();
        Ok(())
    }

    pub fn set_correct(&mut self, id: &str, index: usize) -> Result<(), QuizError> {
        let question = self.question_mut(id)?;
        let count = question.options.len();
        if index >= count {
            return Err(QuizError::OptionOutOfRange { index, count });
        }
        question.correct = index;
        Ok(())
    }

    /// Append an empty question with a fresh ID and return that ID.
    pub fn add_blank_question(&mut self) -> String {
        let id = Uuid::new_v4().to_string();
        self.questions.push(Question::blank(id.clone()));
        id
    }

    /// Remove a question. The last remaining question cannot be removed.
    pub fn remove_question(&mut self, id: &str) -> Result<Question, QuizError> {
        if self.questions.len() <= 1 {
            return Err(QuizError::LastQuestion);
        }
        let position = self
            .questions
            .iter()
            .position(|q| q.id == id)
            .ok_or_else(|| QuizError::QuestionNotFound(id.to_string()))?;
        Ok(self.questions.remove(position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OPTION_COUNT;

    #[test]
    fn drive_links_are_rewritten() {
        assert_eq!(
            sanitize_background_url("https://drive.google.com/file/d/1AbC-d_9/view?usp=sharing"),
            "https://lh3.googleusercontent.com/d/1AbC-d_9"
        );
    }

    #[test]
    fn other_links_pass_through() {
        assert_eq!(
            sanitize_background_url(" https://example.com/bg.png "),
            "https://example.com/bg.png"
        );
        assert_eq!(
            sanitize_background_url("https://drive.google.com/drive/folders"),
            "https://drive.google.com/drive/folders"
        );
        assert_eq!(sanitize_background_url(""), "");
    }

    #[test]
    fn add_and_remove_questions() {
        let mut quiz = QuizContent::default();
        let id = quiz.add_blank_question();
        assert_eq!(quiz.questions.len(), 6);
        let blank = quiz.question(&id).unwrap();
        assert!(blank.text.is_empty());
        assert_eq!(blank.options.len(), OPTION_COUNT);
        assert_eq!(blank.correct, 0);

        let removed = quiz.remove_question(&id).unwrap();
        assert_eq!(removed.id, id);
        assert!(matches!(
            quiz.remove_question("missing"),
            Err(QuizError::QuestionNotFound(_))
        ));
    }

    #[test]
    fn last_question_is_kept() {
        let mut quiz = QuizContent::default();
        quiz.questions.truncate(1);
        assert!(matches!(
            quiz.remove_question("1"),
            Err(QuizError::LastQuestion)
        ));
        assert_eq!(quiz.questions.len(), 1);
    }

    #[test]
    fn edit_question_fields() {
        let mut quiz = QuizContent::default();
        quiz.set_question_text("2", "Đi bên nào?").unwrap();
        quiz.set_option("2", 0, "Bên phải").unwrap();
        quiz.set_correct("2", 0).unwrap();
        let q = quiz.question("2").unwrap();
        assert_eq!(q.text, "Đi bên nào?");
        assert_eq!(q.options[0], "Bên phải");
        assert_eq!(q.correct, 0);

        assert!(matches!(
            quiz.set_option("2", 4, "x"),
            Err(QuizError::OptionOutOfRange { index: 4, count: 4 })
        ));
        assert!(quiz.set_correct("2", 7).is_err());
        assert!(quiz.set_question_text("99", "x").is_err());
    }

    #[test]
    fn topic_and_background() {
        let mut quiz = QuizContent::default();
        quiz.set_topic("  Đi bộ an toàn ");
        quiz.set_background("https://drive.google.com/file/d/XYZ/view");
        assert_eq!(quiz.topic, "Đi bộ an toàn");
        assert_eq!(quiz.background, "https://lh3.googleusercontent.com/d/XYZ");
    }
}
