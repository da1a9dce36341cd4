//! Line-oriented front end.
//!
//! Reads one command or question per line from stdin and prints tagged
//! output, so the game can be driven by a person or by a script:
//! - `[AI]` backend replies
//! - `[STATUS]` session state
//! - `[ERROR]` failures (the game stays playable)
//! - `[GAME OVER]` the final outcome

use guess_core::{
    Backend, Choice, GameConfig, Outcome, Role, Seat, Session, SessionController, SessionError,
    Speaker, Status, TurnResult,
};
use std::io::{self, BufRead, Write};
use std::sync::Arc;

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Answer(Choice),
    Ask(String),
    Hint,
    GiveUp,
    Retry,
    Status,
    Json,
    New,
    Help,
    Quit,
    Unknown(String),
}

impl Command {
    fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let Some(rest) = line.strip_prefix('#') else {
            return Some(Command::Ask(line.to_string()));
        };

        let command = match rest.trim().to_ascii_lowercase().as_str() {
            "yes" | "y" => Command::Answer(Choice::Yes),
            "no" | "n" => Command::Answer(Choice::No),
            "unsure" | "?" => Command::Answer(Choice::Unsure),
            "hint" => Command::Hint,
            "giveup" | "give-up" | "surrender" => Command::GiveUp,
            "retry" => Command::Retry,
            "status" => Command::Status,
            "json" => Command::Json,
            "new" => Command::New,
            "help" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => Command::Unknown(other.to_string()),
        };
        Some(command)
    }
}

fn print_help(role: Role) {
    println!("[HELP]");
    match role {
        Role::BackendAsks => {
            println!("  #yes / #no / #unsure - Answer the current question");
        }
        Role::HumanAsks => {
            println!("  <question>   - Ask a yes/no question or make a guess");
            println!("  #hint        - Ask for a hint");
        }
    }
    println!("  #giveup      - Give up and end the game");
    println!("  #retry       - Resend the last action after an error");
    println!("  #status      - Show current game status");
    println!("  #json        - Dump the session snapshot as JSON");
    println!("  #new         - Start a new game");
    println!("  #help        - Show this help");
    println!("  #quit        - Exit");
}

fn print_reply(result: &TurnResult) {
    println!("[AI]");
    for para in result.reply.split("\n\n") {
        println!("{para}");
    }
    println!();

    if result.verdict.ended {
        let outcome = match result.verdict.outcome {
            Outcome::Win => "WIN",
            Outcome::Loss => "LOSS",
            Outcome::None => "NONE",
        };
        println!("[GAME OVER] {outcome} after {} questions", result.turn_count);
        println!("Type #new to play again or #quit to exit.");
    }
}

fn print_error(controller: &SessionController, err: &SessionError) {
    println!("[ERROR] {err}");
    if let Some(failure) = controller.last_failure() {
        if failure.retryable {
            println!("  Type #retry to try again.");
        }
    }
}

/// Who spoke last and what they said, e.g. `asker (AI): Is the person alive?`.
fn last_turn_line(session: &Session) -> Option<String> {
    let turn = session.transcript().last()?;
    let seat = match session.role().seat(turn.speaker) {
        Seat::Asker => "asker",
        Seat::Responder => "responder",
    };
    let who = match turn.speaker {
        Speaker::Human => "you",
        Speaker::Backend => "AI",
    };
    let content = if turn.visible {
        turn.content.as_str()
    } else {
        "(game prompt)"
    };
    Some(format!("{seat} ({who}): {content}"))
}

fn print_status(controller: &SessionController) {
    let snapshot = controller.snapshot();
    println!("[STATUS]");
    if let Some(role) = snapshot.role {
        println!("  Role: {role}");
    }
    println!("  Status: {:?}", snapshot.status);
    println!("  Questions: {}", snapshot.turn_count);
    if let Some(session) = controller.session() {
        if session.hints_given() > 0 {
            println!("  Hints: {}", session.hints_given());
        }
        if let Some(line) = last_turn_line(session) {
            println!("  Last turn: {line}");
        }
    }
    if snapshot.status == Status::Ended {
        println!("  Outcome: {:?}", snapshot.outcome);
    }
    if let Some(action) = controller.pending_action() {
        println!("  Pending: {action}");
    }
}

async fn start_game(controller: &mut SessionController, config: &GameConfig) {
    controller.reset();
    tracing::debug!(role = %config.role, language = ?config.language, "Starting game");
    match controller.start(config.clone()).await {
        Ok(result) => print_reply(&result),
        Err(e) => print_error(controller, &e),
    }
}

/// Run the game until stdin closes or the player quits.
pub async fn run(backend: Arc<dyn Backend>, config: GameConfig) -> anyhow::Result<()> {
    let mut controller = SessionController::new(backend);

    println!("=== Twenty Questions ({}) ===", config.role);
    print_help(config.role);
    println!();

    let mut stdout = io::stdout();
    start_game(&mut controller, &config).await;
    stdout.flush().ok();

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Error reading input: {e}");
                break;
            }
        };

        let Some(command) = Command::parse(&line) else {
            continue;
        };

        let result = match command {
            Command::Quit => {
                println!("Goodbye!");
                break;
            }
            Command::Help => {
                print_help(config.role);
                None
            }
            Command::Status => {
                print_status(&controller);
                None
            }
            Command::Json => {
                match controller.snapshot().to_json_pretty() {
                    Ok(json) => println!("{json}"),
                    Err(e) => println!("[ERROR] {e}"),
                }
                None
            }
            Command::New => {
                start_game(&mut controller, &config).await;
                None
            }
            Command::Unknown(name) => {
                println!("[ERROR] Unknown command #{name}. Type #help for help.");
                None
            }
            Command::Answer(choice) => Some(controller.answer(choice).await),
            Command::Ask(question) => Some(controller.ask(question).await),
            Command::Hint => Some(controller.request_hint().await),
            Command::GiveUp => Some(controller.surrender().await),
            Command::Retry => Some(controller.retry().await),
        };

        match result {
            Some(Ok(turn)) => print_reply(&turn),
            Some(Err(e)) => print_error(&controller, &e),
            None => {}
        }
        stdout.flush().ok();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use guess_core::{BackendError, MockBackend, MockReply};

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("#yes"), Some(Command::Answer(Choice::Yes)));
        assert_eq!(Command::parse("#NO"), Some(Command::Answer(Choice::No)));
        assert_eq!(Command::parse("  #unsure "), Some(Command::Answer(Choice::Unsure)));
        assert_eq!(Command::parse("#hint"), Some(Command::Hint));
        assert_eq!(Command::parse("#giveup"), Some(Command::GiveUp));
        assert_eq!(Command::parse("#retry"), Some(Command::Retry));
        assert_eq!(Command::parse("#quit"), Some(Command::Quit));
        assert_eq!(
            Command::parse("#dance"),
            Some(Command::Unknown("dance".to_string()))
        );
    }

    #[test]
    fn test_parse_questions() {
        assert_eq!(
            Command::parse("  是男性吗？ "),
            Some(Command::Ask("是男性吗？".to_string()))
        );
        assert_eq!(Command::parse(""), None);
        assert_eq!(Command::parse("   "), None);
    }

    #[tokio::test]
    async fn test_last_turn_line() {
        let backend = Arc::new(MockBackend::with_replies(["Is the person alive?"]));
        let mut controller = SessionController::new(backend);
        controller
            .start(GameConfig::new(Role::BackendAsks))
            .await
            .unwrap();

        let line = last_turn_line(controller.session().unwrap()).unwrap();
        assert_eq!(line, "asker (AI): Is the person alive?");
    }

    #[tokio::test]
    async fn test_last_turn_line_hides_game_prompts() {
        let backend = Arc::new(MockBackend::new());
        backend.queue(MockReply::Error(BackendError::Transient("down".into())));
        let mut controller = SessionController::new(backend);
        assert!(controller
            .start(GameConfig::new(Role::HumanAsks).with_category_seed("poets"))
            .await
            .is_err());

        let line = last_turn_line(controller.session().unwrap()).unwrap();
        assert_eq!(line, "asker (you): (game prompt)");
    }
}
