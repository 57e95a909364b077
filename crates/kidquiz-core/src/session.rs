//! Quiz session state machine.
//!
//! One question at a time moves through
//! `AwaitingStart → Countdown → (answered | TimedOut) → Feedback`, then on to
//! the next question or to `Finished`. The session owns no clock: the host
//! calls [`QuizSession::tick`] once per elapsed second.
//!
//! Every operation returns the event it caused, or `None` when it is not
//! valid in the current phase and was ignored.

use serde::{Deserialize, Serialize};

use crate::error::QuizError;
use crate::model::{percentage, Question};

/// Remaining seconds at or below which ticks are flagged urgent.
pub const URGENT_SECS: u32 = 3;

/// Per-question phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Question shown, countdown not started.
    AwaitingStart,
    /// Countdown running; options selectable while time remains.
    Countdown,
    /// Countdown reached zero without a selection. Answer not yet shown.
    TimedOut,
    /// Correctness and correct answer shown.
    Feedback,
    /// All questions done.
    Finished,
}

/// How a question ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum QuestionOutcome {
    Correct { selected: usize },
    Wrong { selected: usize },
    TimedOut,
}

impl QuestionOutcome {
    pub fn is_correct(&self) -> bool {
        matches!(self, QuestionOutcome::Correct { .. })
    }
}

/// Transition reported back to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    CountdownStarted { remaining: u32 },
    Tick { remaining: u32, urgent: bool },
    TimedOut { correct_index: usize },
    Answered {
        selected: usize,
        correct: bool,
        correct_index: usize,
    },
    Revealed { correct_index: usize },
    NextQuestion { index: usize },
    Finished { score: u32, total: u32 },
}

/// Mascot mood for the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emotion {
    Happy,
    Thinking,
    Excited,
}

/// A single play-through of a quiz.
#[derive(Debug, Clone)]
pub struct QuizSession<'a> {
    questions: &'a [Question],
    timer_secs: u32,
    index: usize,
    score: u32,
    selected: Option<usize>,
    remaining: u32,
    phase: Phase,
    outcomes: Vec<QuestionOutcome>,
}

impl<'a> QuizSession<'a> {
    /// Start a session. A zero timer is treated as one second.
    pub fn new(questions: &'a [Question], timer_secs: u32) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::EmptyQuiz);
        }
        let timer_secs = timer_secs.max(1);
        Ok(Self {
            questions,
            timer_secs,
            index: 0,
            score: 0,
            selected: None,
            remaining: timer_secs,
            phase: Phase::AwaitingStart,
            outcomes: Vec::with_capacity(questions.len()),
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn total(&self) -> u32 {
        self.questions.len() as u32
    }

    /// 0-based index of the current question.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn timer_secs(&self) -> u32 {
        self.timer_secs
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    pub fn is_last_question(&self) -> bool {
        self.index + 1 >= self.questions.len()
    }

    /// The question being played, `None` once finished.
    pub fn current_question(&self) -> Option<&'a Question> {
        if self.is_finished() {
            return None;
        }
        self.questions.get(self.index)
    }

    /// Outcomes of the questions completed so far, in order.
    pub fn outcomes(&self) -> &[QuestionOutcome] {
        &self.outcomes
    }

    fn current_outcome(&self) -> Option<QuestionOutcome> {
        self.outcomes.get(self.index).copied()
    }

    pub fn emotion(&self) -> Emotion {
        match self.phase {
            Phase::AwaitingStart | Phase::Countdown => Emotion::Happy,
            Phase::TimedOut => Emotion::Thinking,
            Phase::Feedback => match self.current_outcome() {
                Some(outcome) if outcome.is_correct() => Emotion::Excited,
                _ => Emotion::Thinking,
            },
            Phase::Finished => {
                if percentage(self.score, self.total()) > 50.0 {
                    Emotion::Excited
                } else {
                    Emotion::Happy
                }
            }
        }
    }

    /// Begin the countdown for the current question.
    pub fn start_countdown(&mut self) -> Option<SessionEvent> {
        if self.phase != Phase::AwaitingStart {
            return None;
        }
        self.remaining = self.timer_secs;
        self.phase = Phase::Countdown;
        Some(SessionEvent::CountdownStarted {
            remaining: self.remaining,
        })
    }

    /// One second elapsed. Ignored outside the countdown.
    pub fn tick(&mut self) -> Option<SessionEvent> {
        if self.phase != Phase::Countdown {
            return None;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining > 0 {
            return Some(SessionEvent::Tick {
                remaining: self.remaining,
                urgent: self.remaining <= URGENT_SECS,
            });
        }
        let question = self.current_question()?;
        self.phase = Phase::TimedOut;
        self.outcomes.push(QuestionOutcome::TimedOut);
        Some(SessionEvent::TimedOut {
            correct_index: question.correct,
        })
    }

    /// Choose an option. Only valid while the countdown has time left.
    pub fn select_option(&mut self, option: usize) -> Option<SessionEvent> {
        if self.phase != Phase::Countdown || self.remaining == 0 {
            return None;
        }
        let question = self.current_question()?;
        if option >= question.options.len() {
            return None;
        }

        let correct = question.is_correct(option);
        self.selected = Some(option);
        self.phase = Phase::Feedback;
        if correct {
            self.score += 1;
            self.outcomes.push(QuestionOutcome::Correct { selected: option });
        } else {
            self.outcomes.push(QuestionOutcome::Wrong { selected: option });
        }
        Some(SessionEvent::Answered {
            selected: option,
            correct,
            correct_index: question.correct,
        })
    }

    /// Show the correct answer after a timeout. Never awards points.
    pub fn reveal_answer(&mut self) -> Option<SessionEvent> {
        if self.phase != Phase::TimedOut {
            return None;
        }
        let question = self.current_question()?;
        self.phase = Phase::Feedback;
        Some(SessionEvent::Revealed {
            correct_index: question.correct,
        })
    }

    /// Move past the feedback to the next question or finish.
    pub fn advance(&mut self) -> Option<SessionEvent> {
        if self.phase != Phase::Feedback {
            return None;
        }
        self.selected = None;
        self.remaining = self.timer_secs;
        self.index += 1;

        if self.index >= self.questions.len() {
            self.phase = Phase::Finished;
            Some(SessionEvent::Finished {
                score: self.score,
                total: self.total(),
            })
        } else {
            self.phase = Phase::AwaitingStart;
            Some(SessionEvent::NextQuestion { index: self.index })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::default_questions;

    fn questions() -> Vec<Question> {
        default_questions()
    }

    fn run_out_clock(session: &mut QuizSession<'_>) -> Option<SessionEvent> {
        let mut last = None;
        for _ in 0..session.timer_secs() {
            last = session.tick();
        }
        last
    }

    #[test]
    fn empty_quiz_is_rejected() {
        let err = QuizSession::new(&[], 10).unwrap_err();
        assert!(matches!(err, QuizError::EmptyQuiz));
    }

    #[test]
    fn starts_awaiting() {
        let qs = questions();
        let session = QuizSession::new(&qs, 10).unwrap();
        assert_eq!(session.phase(), Phase::AwaitingStart);
        assert_eq!(session.remaining(), 10);
        assert_eq!(session.score(), 0);
        assert_eq!(session.total(), 5);
        assert_eq!(session.emotion(), Emotion::Happy);
    }

    #[test]
    fn countdown_only_from_awaiting_start() {
        let qs = questions();
        let mut session = QuizSession::new(&qs, 10).unwrap();
        assert_eq!(
            session.start_countdown(),
            Some(SessionEvent::CountdownStarted { remaining: 10 })
        );
        assert_eq!(session.start_countdown(), None);
        assert_eq!(session.phase(), Phase::Countdown);
    }

    #[test]
    fn ticks_ignored_before_start() {
        let qs = questions();
        let mut session = QuizSession::new(&qs, 10).unwrap();
        assert_eq!(session.tick(), None);
        assert_eq!(session.remaining(), 10);
    }

    #[test]
    fn final_seconds_are_urgent() {
        let qs = questions();
        let mut session = QuizSession::new(&qs, 5).unwrap();
        session.start_countdown();
        assert_eq!(
            session.tick(),
            Some(SessionEvent::Tick {
                remaining: 4,
                urgent: false
            })
        );
        assert_eq!(
            session.tick(),
            Some(SessionEvent::Tick {
                remaining: 3,
                urgent: true
            })
        );
    }

    #[test]
    fn timeout_does_not_reveal_or_score() {
        let qs = questions();
        let mut session = QuizSession::new(&qs, 10).unwrap();
        session.start_countdown();
        let event = run_out_clock(&mut session);
        assert_eq!(event, Some(SessionEvent::TimedOut { correct_index: 0 }));
        assert_eq!(session.phase(), Phase::TimedOut);
        assert_eq!(session.remaining(), 0);
        assert_eq!(session.score(), 0);
        assert_eq!(session.emotion(), Emotion::Thinking);
        assert_eq!(session.outcomes(), &[QuestionOutcome::TimedOut]);
    }

    #[test]
    fn late_tick_after_timeout_is_noop() {
        let qs = questions();
        let mut session = QuizSession::new(&qs, 2).unwrap();
        session.start_countdown();
        run_out_clock(&mut session);
        assert_eq!(session.tick(), None);
        assert_eq!(session.phase(), Phase::TimedOut);
        assert_eq!(session.outcomes().len(), 1);
    }

    #[test]
    fn selection_after_timeout_is_rejected() {
        let qs = questions();
        let mut session = QuizSession::new(&qs, 3).unwrap();
        session.start_countdown();
        run_out_clock(&mut session);
        assert_eq!(session.select_option(0), None);
        assert_eq!(session.score(), 0);
        assert_eq!(session.phase(), Phase::TimedOut);
    }

    #[test]
    fn selection_requires_countdown() {
        let qs = questions();
        let mut session = QuizSession::new(&qs, 10).unwrap();
        assert_eq!(session.select_option(0), None);
        assert_eq!(session.score(), 0);
        assert_eq!(session.selected(), None);
    }

    #[test]
    fn correct_selection_scores_once() {
        let qs = questions();
        let mut session = QuizSession::new(&qs, 10).unwrap();
        session.start_countdown();
        session.tick();
        assert_eq!(
            session.select_option(0),
            Some(SessionEvent::Answered {
                selected: 0,
                correct: true,
                correct_index: 0
            })
        );
        assert_eq!(session.select_option(0), None);
        assert_eq!(session.select_option(1), None);
        assert_eq!(session.score(), 1);
        assert_eq!(session.selected(), Some(0));
        assert_eq!(session.phase(), Phase::Feedback);
        assert_eq!(session.emotion(), Emotion::Excited);
    }

    #[test]
    fn wrong_selection_scores_nothing() {
        let qs = questions();
        let mut session = QuizSession::new(&qs, 10).unwrap();
        session.start_countdown();
        let event = session.select_option(3).unwrap();
        assert!(matches!(event, SessionEvent::Answered { correct: false, .. }));
        assert_eq!(session.score(), 0);
        assert_eq!(session.emotion(), Emotion::Thinking);
        assert_eq!(session.outcomes(), &[QuestionOutcome::Wrong { selected: 3 }]);
    }

    #[test]
    fn ticks_stop_after_answer() {
        let qs = questions();
        let mut session = QuizSession::new(&qs, 10).unwrap();
        session.start_countdown();
        session.tick();
        session.select_option(0);
        assert_eq!(session.tick(), None);
        assert_eq!(session.remaining(), 9);
    }

    #[test]
    fn out_of_range_option_is_ignored() {
        let qs = questions();
        let mut session = QuizSession::new(&qs, 10).unwrap();
        session.start_countdown();
        assert_eq!(session.select_option(4), None);
        assert_eq!(session.phase(), Phase::Countdown);
    }

    #[test]
    fn reveal_only_from_timed_out() {
        let qs = questions();
        let mut session = QuizSession::new(&qs, 10).unwrap();
        assert_eq!(session.reveal_answer(), None);
        session.start_countdown();
        assert_eq!(session.reveal_answer(), None);
        session.select_option(1);
        assert_eq!(session.reveal_answer(), None);
    }

    #[test]
    fn reveal_moves_to_feedback_without_points() {
        let qs = questions();
        let mut session = QuizSession::new(&qs, 1).unwrap();
        session.start_countdown();
        session.tick();
        assert_eq!(
            session.reveal_answer(),
            Some(SessionEvent::Revealed { correct_index: 0 })
        );
        assert_eq!(session.phase(), Phase::Feedback);
        assert_eq!(session.score(), 0);
        assert_eq!(session.reveal_answer(), None);
    }

    #[test]
    fn advance_only_from_feedback() {
        let qs = questions();
        let mut session = QuizSession::new(&qs, 10).unwrap();
        assert_eq!(session.advance(), None);
        session.start_countdown();
        assert_eq!(session.advance(), None);
        session.select_option(0);
        assert_eq!(
            session.advance(),
            Some(SessionEvent::NextQuestion { index: 1 })
        );
        assert_eq!(session.phase(), Phase::AwaitingStart);
        assert_eq!(session.remaining(), 10);
        assert_eq!(session.selected(), None);
    }

    #[test]
    fn zero_timer_is_clamped() {
        let qs = questions();
        let mut session = QuizSession::new(&qs, 0).unwrap();
        session.start_countdown();
        assert_eq!(session.remaining(), 1);
        assert!(matches!(session.tick(), Some(SessionEvent::TimedOut { .. })));
    }

    #[test]
    fn timeout_then_four_correct() {
        let qs = questions();
        let mut session = QuizSession::new(&qs, 10).unwrap();

        // Question 1 expires.
        session.start_countdown();
        run_out_clock(&mut session);
        assert_eq!(session.phase(), Phase::TimedOut);
        assert_eq!(session.score(), 0);
        session.reveal_answer();
        assert_eq!(session.advance(), Some(SessionEvent::NextQuestion { index: 1 }));

        // Questions 2-5 answered correctly with time to spare.
        let mut finished = None;
        for _ in 1..5 {
            session.start_countdown();
            session.tick();
            session.tick();
            let correct = session.current_question().unwrap().correct;
            session.select_option(correct);
            finished = session.advance();
        }

        assert_eq!(finished, Some(SessionEvent::Finished { score: 4, total: 5 }));
        assert!(session.is_finished());
        assert!(session.current_question().is_none());
        assert_eq!(session.emotion(), Emotion::Excited);
        assert_eq!(
            session.outcomes().iter().filter(|o| o.is_correct()).count(),
            4
        );
    }

    #[test]
    fn finished_session_ignores_everything() {
        let qs = vec![questions().remove(0)];
        let mut session = QuizSession::new(&qs, 10).unwrap();
        session.start_countdown();
        session.select_option(1);
        assert_eq!(session.advance(), Some(SessionEvent::Finished { score: 0, total: 1 }));
        assert_eq!(session.start_countdown(), None);
        assert_eq!(session.tick(), None);
        assert_eq!(session.select_option(0), None);
        assert_eq!(session.reveal_answer(), None);
        assert_eq!(session.advance(), None);
        assert_eq!(session.score(), 0);
        assert_eq!(session.emotion(), Emotion::Happy);
    }

    #[test]
    fn score_never_exceeds_total() {
        let qs = questions();
        let mut session = QuizSession::new(&qs, 10).unwrap();
        while !session.is_finished() {
            session.start_countdown();
            let correct = session.current_question().unwrap().correct;
            session.select_option(correct);
            session.select_option(correct);
            session.advance();
        }
        assert_eq!(session.score(), session.total());
    }
}
