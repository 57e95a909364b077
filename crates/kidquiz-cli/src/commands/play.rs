//! The `kidquiz play` command.

use std::io::BufRead;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc;
use tracing::warn;

use kidquiz_core::assessment::AssessmentGenerator;
use kidquiz_core::model::{option_letter, parse_option_letter, AssessmentResult, QuizContent};
use kidquiz_core::parser::{parse_quiz, validate_quiz};
use kidquiz_core::phrases::{answer_line, reveal_line, TIMEOUT_MESSAGE};
use kidquiz_core::report::SessionReport;
use kidquiz_core::session::{Emotion, Phase, QuizSession, SessionEvent};
use kidquiz_providers::config::load_config_from;

use crate::narration::Voice;

pub struct PlayOptions {
    pub quiz: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub no_voice: bool,
    pub offline: bool,
    pub report: Option<PathBuf>,
    pub seed: Option<u64>,
}

fn mascot(emotion: Emotion) -> &'static str {
    match emotion {
        Emotion::Happy => "😊",
        Emotion::Thinking => "🤔",
        Emotion::Excited => "🤩",
    }
}

fn is_quit(line: &str) -> bool {
    matches!(line.trim().to_lowercase().as_str(), "q" | "quit" | "thoat" | "thoát")
}

/// Forward stdin lines to the game loop. The channel closes at end of input.
///
/// Blocking reads run on a detached thread so exit never waits on them.
fn spawn_input_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.blocking_send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("failed to read input: {e}");
                    break;
                }
            }
        }
    });
    rx
}

pub async fn execute(options: PlayOptions) -> Result<()> {
    let config = load_config_from(options.config.as_deref())?;

    let quiz = match &options.quiz {
        Some(path) => parse_quiz(path)?,
        None => QuizContent::default(),
    };
    for w in validate_quiz(&quiz) {
        let prefix = w
            .question_id
            .map(|id| format!("[{id}] "))
            .unwrap_or_default();
        eprintln!("WARNING: {prefix}{}", w.message);
    }

    let timer_secs = config.timer_secs.unwrap_or(quiz.timer_secs);
    let mut session = QuizSession::new(&quiz.questions, timer_secs)?;

    let voice = if options.no_voice {
        Voice::silent()
    } else {
        Voice::from_config(&config, options.offline)
    };

    let remote_assessment = if options.offline {
        None
    } else {
        config.build_assessment_provider().unwrap_or_else(|e| {
            warn!("remote assessment unavailable: {e:#}");
            None
        })
    };
    let mut generator =
        AssessmentGenerator::new(remote_assessment).with_min_delay(config.min_review_delay());
    let mut rng = match options.seed {
        Some(seed) => {
            generator = generator.with_seed(seed);
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_entropy(),
    };

    println!("🚦 {}", quiz.topic);
    println!(
        "{} câu hỏi, mỗi câu {} giây. Gõ q để dừng.\n",
        session.total(),
        session.timer_secs()
    );

    let mut input = spawn_input_reader();
    let mut ticker = tokio::time::interval(Duration::from_secs(1));

    loop {
        match session.phase() {
            Phase::AwaitingStart => {
                let Some(question) = session.current_question() else {
                    break;
                };
                println!(
                    "{} Câu {}/{}: {}",
                    mascot(session.emotion()),
                    session.index() + 1,
                    session.total(),
                    question.text
                );
                for (i, option) in question.options.iter().enumerate() {
                    println!("   {}. {option}", option_letter(i));
                }
                voice.say(&question.text).await;
                println!("(Enter để bắt đầu đếm giờ, hoặc gõ luôn đáp án A-D)");

                let Some(line) = input.recv().await else {
                    return stop_early(&session, &voice);
                };
                if is_quit(&line) {
                    return stop_early(&session, &voice);
                }
                if let Some(SessionEvent::CountdownStarted { remaining }) =
                    session.start_countdown()
                {
                    ticker.reset();
                    println!("⏳ {remaining}");
                }
                if let Some(choice) = parse_option_letter(&line) {
                    answer(&mut session, choice, &voice, &mut rng).await;
                }
            }
            Phase::Countdown => {
                tokio::select! {
                    _ = ticker.tick() => match session.tick() {
                        Some(SessionEvent::Tick { remaining, urgent }) => {
                            if urgent {
                                println!("⏰ {remaining}");
                            } else {
                                println!("⏳ {remaining}");
                            }
                        }
                        Some(SessionEvent::TimedOut { .. }) => {
                            println!("{} {TIMEOUT_MESSAGE}", mascot(session.emotion()));
                            voice.say(TIMEOUT_MESSAGE).await;
                        }
                        _ => {}
                    },
                    line = input.recv() => {
                        let Some(line) = line else {
                            return stop_early(&session, &voice);
                        };
                        if is_quit(&line) {
                            return stop_early(&session, &voice);
                        }
                        match parse_option_letter(&line) {
                            Some(choice) => answer(&mut session, choice, &voice, &mut rng).await,
                            None => println!("Chọn A, B, C hoặc D nhen!"),
                        }
                    }
                }
            }
            Phase::TimedOut => {
                println!("(Enter để xem đáp án)");
                let Some(line) = input.recv().await else {
                    return stop_early(&session, &voice);
                };
                if is_quit(&line) {
                    return stop_early(&session, &voice);
                }
                if let Some(SessionEvent::Revealed { correct_index }) = session.reveal_answer() {
                    let line = reveal_line(correct_index);
                    println!("👉 {line}");
                    voice.say(&line).await;
                }
            }
            Phase::Feedback => {
                println!("(Enter để tiếp tục)");
                let Some(line) = input.recv().await else {
                    return stop_early(&session, &voice);
                };
                if is_quit(&line) {
                    return stop_early(&session, &voice);
                }
                voice.stop();
                if let Some(SessionEvent::NextQuestion { .. }) = session.advance() {
                    println!();
                }
            }
            Phase::Finished => break,
        }
    }

    println!(
        "\n{} Con được {}/{} điểm! Thầy đang chấm bài...",
        mascot(session.emotion()),
        session.score(),
        session.total()
    );
    let result = generator
        .assess(session.score(), session.total(), &quiz.topic)
        .await;
    print_assessment(&result);
    voice.say(&result.narration()).await;

    if let Some(path) = &options.report {
        let report = SessionReport::from_session(&session, &quiz.questions, &quiz.topic, result);
        report.save_json(path)?;
        eprintln!(
            "Report saved to: {} ({})",
            path.display(),
            report.finished_at.format("%Y-%m-%d %H:%M UTC")
        );
    }

    voice.finish().await;
    Ok(())
}

async fn answer(session: &mut QuizSession<'_>, choice: usize, voice: &Voice, rng: &mut StdRng) {
    match session.select_option(choice) {
        Some(SessionEvent::Answered {
            correct,
            correct_index,
            ..
        }) => {
            let line = answer_line(correct, rng);
            println!("{} {line}", mascot(session.emotion()));
            if !correct {
                println!("👉 {}", reveal_line(correct_index));
            }
            voice.say(line).await;
        }
        _ => println!("Chọn A, B, C hoặc D nhen!"),
    }
}

fn stop_early(session: &QuizSession<'_>, voice: &Voice) -> Result<()> {
    voice.stop();
    println!(
        "\nTạm dừng ở câu {}/{}. Điểm hiện tại: {}",
        session.index() + 1,
        session.total(),
        session.score()
    );
    Ok(())
}

pub fn print_assessment(result: &AssessmentResult) {
    println!("\n{} {}", result.reward_emoji, result.reward_name);
    println!("Mức đánh giá: {}", result.level);
    println!("{}", result.message);
    println!("Nhận xét: {}", result.teacher_comment);
}
