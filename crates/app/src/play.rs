//! Interactive quiz loop on stdin/stdout.

use std::sync::Arc;

use quiz_core::model::Quiz;
use quiz_core::time::format_remaining;
use services::{Navigation, QuizSession, SessionError, SessionState, TickStatus};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Remaining-time marks that get a warning line.
const WARN_AT_SECS: [u32; 2] = [60, 10];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Key {
    /// 0-based option index.
    Select(usize),
    Next,
    Previous,
    Submit,
    Retake,
    Quit,
    Unknown,
}

fn parse_key(input: &str) -> Key {
    let input = input.trim();
    if let Ok(number) = input.parse::<usize>() {
        return match number.checked_sub(1) {
            Some(index) => Key::Select(index),
            None => Key::Unknown,
        };
    }
    match input.to_ascii_lowercase().as_str() {
        "n" | "next" => Key::Next,
        "p" | "prev" | "previous" => Key::Previous,
        "s" | "submit" => Key::Submit,
        "r" | "retake" => Key::Retake,
        "q" | "quit" => Key::Quit,
        _ => Key::Unknown,
    }
}

enum Flow {
    Continue,
    Done,
}

pub async fn run(
    session: &mut QuizSession,
    quiz: Arc<Quiz>,
) -> Result<(), Box<dyn std::error::Error>> {
    session.start_attempt(quiz).await?;
    render_question(session);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    session.reset();
                    return Ok(());
                };
                if let Flow::Done = handle_key(session, parse_key(&line)).await? {
                    return Ok(());
                }
            }
            Some(tick) = session.recv_tick() => {
                match session.on_tick(tick).await {
                    TickStatus::Running { remaining_secs } if WARN_AT_SECS.contains(&remaining_secs) => {
                        println!("!! {} left", format_remaining(remaining_secs));
                    }
                    TickStatus::Expired => {
                        println!("Time is up. Your answers were submitted.");
                        render_result(session);
                    }
                    TickStatus::Running { .. } | TickStatus::Ignored => {}
                }
            }
        }
    }
}

async fn handle_key(session: &mut QuizSession, key: Key) -> Result<Flow, SessionError> {
    match session.state() {
        SessionState::InProgress => handle_in_progress(session, key).await,
        SessionState::Completed => match key {
            Key::Retake => {
                session.retake().await?;
                render_question(session);
                Ok(Flow::Continue)
            }
            Key::Quit => Ok(Flow::Done),
            _ => {
                println!("r retake  q quit");
                Ok(Flow::Continue)
            }
        },
        SessionState::Idle | SessionState::Submitting => Ok(Flow::Done),
    }
}

async fn handle_in_progress(session: &mut QuizSession, key: Key) -> Result<Flow, SessionError> {
    match key {
        Key::Select(option) => {
            let question = session
                .attempt()
                .map(|attempt| attempt.current_index())
                .ok_or(SessionError::NoAttempt)?;
            match session.select_answer(question, option) {
                Ok(()) => render_question(session),
                Err(SessionError::InvalidSelection { .. }) => println!("No such option."),
                Err(err) => return Err(err),
            }
        }
        Key::Next => match session.advance().await? {
            Navigation::Moved(_) | Navigation::Stayed => render_question(session),
            Navigation::Blocked => println!("Pick an answer before moving on."),
            Navigation::Submitted => render_result(session),
        },
        Key::Previous => match session.retreat()? {
            Navigation::Moved(_) => render_question(session),
            _ => println!("Already at the first question."),
        },
        Key::Submit => {
            session.submit().await?;
            render_result(session);
        }
        Key::Quit => {
            session.reset();
            println!("Attempt abandoned.");
            return Ok(Flow::Done);
        }
        Key::Retake | Key::Unknown => print_keys(session),
    }
    Ok(Flow::Continue)
}

fn render_question(session: &QuizSession) {
    let (Some(attempt), Some(progress), Some(question)) = (
        session.attempt(),
        session.progress(),
        session.current_question(),
    ) else {
        return;
    };

    println!();
    println!(
        "{}  [{}/{}]  answered {}  time left {}",
        attempt.quiz().course_title(),
        progress.position,
        progress.total,
        progress.answered,
        format_remaining(progress.remaining_secs),
    );
    println!("{}", question.prompt());
    let chosen = attempt.answer(attempt.current_index());
    for (index, option) in question.options().iter().enumerate() {
        let marker = if chosen == Some(index) { '*' } else { ' ' };
        println!("  {marker} {}. {option}", index + 1);
    }
    print_keys(session);
}

fn print_keys(session: &QuizSession) {
    let options = session
        .current_question()
        .map_or(0, |question| question.option_count());
    println!("[1-{options}] select  n next  p previous  s submit  q quit");
}

fn render_result(session: &QuizSession) {
    let Some(result) = session.result() else {
        return;
    };
    println!();
    println!(
        "Score: {}%  ({} correct, {} incorrect of {})",
        result.display_percentage(),
        result.correct,
        result.incorrect(),
        result.total,
    );
    println!(
        "{} (pass mark {}%)",
        if result.passed { "Passed" } else { "Not passed" },
        session.config().pass_threshold.percent(),
    );
    if result.is_unverified() {
        match session.fallback_reason() {
            Some(reason) => println!("Unverified: scored locally because {reason}."),
            None => println!("Unverified: scored locally."),
        }
    }
    println!("r retake  q quit");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_select_one_based_options() {
        assert_eq!(parse_key("1"), Key::Select(0));
        assert_eq!(parse_key(" 3 "), Key::Select(2));
        assert_eq!(parse_key("0"), Key::Unknown);
    }

    #[test]
    fn letters_map_to_commands() {
        assert_eq!(parse_key("n"), Key::Next);
        assert_eq!(parse_key("P"), Key::Previous);
        assert_eq!(parse_key("submit"), Key::Submit);
        assert_eq!(parse_key("r"), Key::Retake);
        assert_eq!(parse_key("q"), Key::Quit);
        assert_eq!(parse_key("x"), Key::Unknown);
        assert_eq!(parse_key(""), Key::Unknown);
    }
}
