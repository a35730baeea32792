use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;

use quiz_core::model::{Answer, QuestionKind, QuizId};
use services::{QuizPlayer, SessionError, SessionPhase, TimerEvent, TimerOutcome, Urgency};

use crate::render;

/// One line of terminal input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    /// Zero-based option index; typed one-based.
    Choose(usize),
    Skip,
    Next,
    Prev,
    Finish,
    Review,
    Restart,
    Help,
    Quit,
    Blank,
}

/// Parse a terminal line into an [`Input`].
///
/// # Errors
///
/// Returns a user-facing message for unrecognized input.
pub fn parse_input(line: &str) -> Result<Input, String> {
    let word = line.trim().to_ascii_lowercase();
    let input = match word.as_str() {
        "" => Input::Blank,
        "s" | "skip" => Input::Skip,
        "n" | "next" => Input::Next,
        "p" | "prev" => Input::Prev,
        "f" | "finish" => Input::Finish,
        "r" | "review" => Input::Review,
        "again" | "restart" => Input::Restart,
        "h" | "help" | "?" => Input::Help,
        "q" | "quit" | "exit" => Input::Quit,
        other => match other.parse::<usize>() {
            Ok(n) if n > 0 => Input::Choose(n - 1),
            _ => return Err(format!("unrecognized input {other:?}; type 'help'")),
        },
    };
    Ok(input)
}

/// Play `quiz_id` until the user quits or stdin closes.
///
/// # Errors
///
/// Fails if the quiz cannot be started or stdin cannot be read. Errors from
/// individual commands are printed and the loop continues.
pub async fn run(
    player: &mut QuizPlayer,
    events: &mut UnboundedReceiver<TimerEvent>,
    quiz_id: QuizId,
) -> Result<(), Box<dyn std::error::Error>> {
    player.select_quiz(quiz_id).await?;
    let mut remaining = time_limit(player);
    println!("{}", render::HELP);
    show(player, remaining);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_input(&line) {
                    Ok(Input::Quit) => break,
                    Ok(Input::Blank) => show(player, remaining),
                    Ok(Input::Help) => println!("{}", render::HELP),
                    Ok(input) => {
                        match apply(player, input) {
                            Ok(()) if input == Input::Restart => remaining = time_limit(player),
                            Ok(()) => {}
                            Err(err) => println!("{err}"),
                        }
                        show(player, remaining);
                    }
                    Err(message) => println!("{message}"),
                }
            }
            Some(event) = events.recv() => match player.on_timer(event) {
                TimerOutcome::Tick { remaining_secs } => {
                    let previous = remaining.replace(remaining_secs);
                    if previous.map(Urgency::for_remaining) != Some(Urgency::for_remaining(remaining_secs)) {
                        println!("{}", render::time_left(remaining_secs));
                    }
                }
                TimerOutcome::Expired(_) => {
                    println!("Time is up.");
                    remaining = Some(0);
                    show(player, remaining);
                }
                TimerOutcome::Ignored => {}
            },
        }
    }

    player.abandon();
    Ok(())
}

fn time_limit(player: &QuizPlayer) -> Option<u32> {
    player
        .session()
        .and_then(|session| session.quiz().time_limit_secs())
}

fn apply(player: &mut QuizPlayer, input: Input) -> Result<(), SessionError> {
    let active = player
        .session()
        .map(|session| {
            let question = session.active_question();
            (question.id(), question.kind())
        })
        .ok_or(SessionError::NoActiveSession)?;

    match input {
        Input::Choose(index) => match active.1 {
            QuestionKind::SingleChoice => player.select_answer(active.0, Answer::Single(index)),
            QuestionKind::MultipleChoice => player.toggle_option(active.0, index),
        },
        Input::Skip => player.skip(active.0),
        Input::Next => {
            if !player.advance()? {
                println!("Already at the last question.");
            }
            Ok(())
        }
        Input::Prev => {
            if !player.retreat()? {
                println!("Already at the first question.");
            }
            Ok(())
        }
        Input::Finish => player.finish().map(|_| ()),
        Input::Review => player.enter_review(),
        Input::Restart => player.restart(),
        Input::Help | Input::Quit | Input::Blank => Ok(()),
    }
}

fn show(player: &QuizPlayer, remaining: Option<u32>) {
    let Some(snapshot) = player.snapshot() else {
        return;
    };
    match player.phase() {
        SessionPhase::Completed => print!("{}", render::result_screen(&snapshot)),
        SessionPhase::InProgress | SessionPhase::Reviewing => {
            print!("{}", render::question_screen(&snapshot, remaining));
        }
        SessionPhase::Selecting => {}
    }
}
