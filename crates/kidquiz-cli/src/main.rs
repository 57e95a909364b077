//! kidquiz CLI: play, narrate, and edit traffic-safety quizzes.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;
mod narration;

#[derive(Parser)]
#[command(
    name = "kidquiz",
    version,
    about = "Narrated traffic-safety quiz for children"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a quiz in the terminal
    Play {
        /// Quiz TOML file (built-in bicycle quiz if omitted)
        #[arg(long)]
        quiz: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Do not speak at all
        #[arg(long)]
        no_voice: bool,

        /// Skip remote speech and assessment
        #[arg(long)]
        offline: bool,

        /// Write a JSON session report here
        #[arg(long)]
        report: Option<PathBuf>,

        /// Seed for mascot lines and local assessments
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Produce the end-of-quiz assessment for a score
    Assess {
        #[arg(long)]
        score: u32,

        #[arg(long)]
        total: u32,

        /// Quiz topic
        #[arg(long)]
        topic: Option<String>,

        /// Skip the remote generator
        #[arg(long)]
        offline: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Speak a line with the configured voice
    Say {
        text: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Check a quiz file for authoring mistakes
    Validate {
        #[arg(long)]
        quiz: PathBuf,
    },

    /// Show the questions of a quiz
    List {
        #[arg(long)]
        quiz: PathBuf,
    },

    /// Append a question to a quiz file
    AddQuestion {
        #[arg(long)]
        quiz: PathBuf,

        #[arg(long)]
        text: String,

        /// Answer options in order (A, B, C, D)
        #[arg(long = "option", required = true)]
        options: Vec<String>,

        /// Correct option, as a letter (A-D) or 0-based index
        #[arg(long)]
        correct: String,
    },

    /// Remove a question from a quiz file
    RemoveQuestion {
        #[arg(long)]
        quiz: PathBuf,

        #[arg(long)]
        id: String,
    },

    /// Rename the topic of a quiz
    SetTopic {
        #[arg(long)]
        quiz: PathBuf,

        #[arg(long)]
        topic: String,
    },

    /// Change the background image of a quiz
    SetBackground {
        #[arg(long)]
        quiz: PathBuf,

        #[arg(long)]
        url: String,
    },

    /// Create starter config and the default quiz
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("kidquiz=info".parse().unwrap())
                .add_directive("kidquiz_core=info".parse().unwrap())
                .add_directive("kidquiz_providers=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Play {
            quiz,
            config,
            no_voice,
            offline,
            report,
            seed,
        } => {
            commands::play::execute(commands::play::PlayOptions {
                quiz,
                config,
                no_voice,
                offline,
                report,
                seed,
            })
            .await
        }
        Commands::Assess {
            score,
            total,
            topic,
            offline,
            config,
        } => commands::assess::execute(score, total, topic, offline, config).await,
        Commands::Say { text, config } => commands::say::execute(text, config).await,
        Commands::Validate { quiz } => commands::validate::execute(quiz),
        Commands::List { quiz } => commands::list::execute(quiz),
        Commands::AddQuestion {
            quiz,
            text,
            options,
            correct,
        } => commands::edit::add_question(quiz, text, options, correct),
        Commands::RemoveQuestion { quiz, id } => commands::edit::remove_question(quiz, id),
        Commands::SetTopic { quiz, topic } => commands::edit::set_topic(quiz, topic),
        Commands::SetBackground { quiz, url } => commands::edit::set_background(quiz, url),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
