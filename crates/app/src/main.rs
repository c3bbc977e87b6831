use std::fmt;
use std::sync::Arc;

use quiz_core::Clock;
use quiz_core::model::{Quiz, QuizId};
use quiz_core::time::format_remaining;
use services::{ApiConfig, ClientConfig, HttpQuizApi, QuizSession};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt as log_fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod play;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    MissingQuizId,
    InvalidQuizId { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::MissingQuizId => write!(f, "take requires a quiz id"),
            ArgsError::InvalidQuizId { raw } => write!(f, "invalid quiz id: {raw:?}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- list   [--base-url <url>]");
    eprintln!("  cargo run -p app -- take   <quiz-id> [--base-url <url>]");
    eprintln!("  cargo run -p app -- health [--base-url <url>]");
    eprintln!();
    eprintln!("Environment (a .env file is read first):");
    eprintln!("  QUIZ_API_BASE_URL, QUIZ_API_TOKEN, QUIZ_API_TIMEOUT_SECS,");
    eprintln!("  QUIZ_PASS_THRESHOLD, QUIZ_REQUIRE_ANSWER_TO_ADVANCE, RUST_LOG");
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    List,
    Take(QuizId),
    Health,
}

#[derive(Debug, PartialEq, Eq)]
struct Args {
    command: Command,
    base_url: Option<String>,
}

impl Args {
    /// Parses everything after the binary name. No subcommand means `list`.
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Option<Self>, ArgsError> {
        let mut args = args.into_iter().peekable();
        let command = match args.peek().map(String::as_str) {
            None => Command::List,
            Some("--help" | "-h") => return Ok(None),
            Some(first) if first.starts_with("--") => Command::List,
            Some("list") => {
                args.next();
                Command::List
            }
            Some("health") => {
                args.next();
                Command::Health
            }
            Some("take") => {
                args.next();
                let raw = args.next().ok_or(ArgsError::MissingQuizId)?;
                let id = raw
                    .parse::<QuizId>()
                    .map_err(|_| ArgsError::InvalidQuizId { raw: raw.clone() })?;
                Command::Take(id)
            }
            Some(other) => return Err(ArgsError::UnknownCommand(other.to_string())),
        };

        let mut base_url = None;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--base-url" => base_url = Some(require_value(&mut args, "--base-url")?),
                "--help" | "-h" => return Ok(None),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Some(Self { command, base_url }))
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // stdout belongs to the quiz itself.
    let stderr_layer = log_fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);
    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing();

    let Some(args) = Args::parse(std::env::args().skip(1)).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?
    else {
        print_usage();
        return Ok(());
    };

    let mut config = ClientConfig::from_env()?;
    if let Some(raw) = args.base_url.as_deref() {
        config.api = ApiConfig::new(raw, config.api.timeout)?;
    }
    let api = Arc::new(HttpQuizApi::new(&config.api, config.user.clone())?);
    debug!(base_url = %api.base_url(), user = ?config.user, "quiz backend configured");

    if args.command == Command::Health {
        api.health().await?;
        println!("{} is healthy", api.base_url());
        return Ok(());
    }

    let mut session =
        QuizSession::new(Clock::system(), api.clone(), api).with_config(config.session);
    load_catalog_or_empty(&mut session).await;

    match args.command {
        Command::List => {
            print_catalog(&session);
            Ok(())
        }
        Command::Take(id) => {
            let quiz = session
                .find_quiz(&id)
                .ok_or_else(|| format!("no quiz with id {id} in the catalog"))?;
            play::run(&mut session, quiz).await
        }
        Command::Health => Ok(()),
    }
}

/// A catalog failure is reported and leaves the session with an empty list.
async fn load_catalog_or_empty(session: &mut QuizSession) {
    if let Err(err) = session.load_catalog().await {
        eprintln!("{err}; continuing with an empty catalog");
    }
}

fn print_catalog(session: &QuizSession) {
    let quizzes = session.catalog();
    if quizzes.is_empty() {
        println!("No quizzes available.");
        return;
    }
    for quiz in quizzes {
        println!("{}", catalog_line(quiz));
    }
    let summary = session.catalog_summary();
    println!();
    println!(
        "{} quizzes, {} questions in total",
        summary.quizzes, summary.questions
    );
}

fn catalog_line(quiz: &Quiz) -> String {
    let pass_mark = quiz
        .passing_criteria()
        .map_or_else(String::new, |percent| format!("  pass mark {percent}%"));
    format!(
        "{:<40} {:<16} {:>3} questions  {}{pass_mark}",
        quiz.course_title(),
        quiz.id().as_str(),
        quiz.question_count(),
        format_remaining(quiz.duration_secs()),
    )
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
