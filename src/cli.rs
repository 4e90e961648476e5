//! Terminal triage: a stdin/stdout REPL over the shared deck queue.

use std::sync::Arc;

use futures::{Stream, StreamExt, stream};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::deck::{DeckQueue, DeckState, FeedbackCard, Filter, SwipeDirection};

/// One parsed REPL line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Swipe(SwipeDirection),
    /// Star the current card.
    Star,
    Filter(Filter),
    Reset,
    /// Finish review, with optional argumentation text.
    Done(Option<String>),
    Show,
    Help,
    Quit,
}

/// Parse a REPL line. `Err` carries a message for the user.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let mut parts = line.split_whitespace();
    let head = parts.next().unwrap_or_default().to_lowercase();
    match head.as_str() {
        "y" | "yes" | "right" | "r" => Ok(Command::Swipe(SwipeDirection::Right)),
        "n" | "no" | "left" | "l" => Ok(Command::Swipe(SwipeDirection::Left)),
        "star" | "s" | "*" => Ok(Command::Star),
        "filter" | "f" => {
            let arg = parts.next().ok_or("usage: filter all|feature|bug")?;
            arg.to_lowercase().parse().map(Command::Filter)
        }
        "reset" => Ok(Command::Reset),
        "done" | "review" => {
            let argumentation = line
                .trim()
                .split_once(char::is_whitespace)
                .map(|(_, rest)| rest.trim().to_string())
                .filter(|rest| !rest.is_empty());
            Ok(Command::Done(argumentation))
        }
        "show" | "" => Ok(Command::Show),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        other => Err(format!("Unknown command: {other} (try 'help')")),
    }
}

fn render_card(card: &FeedbackCard, favorite: bool) -> String {
    let star = if favorite { " ★" } else { "" };
    let mut out = format!(
        "{} [{}] {}{}\n   {}\n   {} mentions · {}",
        card.emoji,
        card.kind,
        card.title,
        star,
        card.summary,
        card.mentions,
        card.tags.join(", ")
    );
    for ev in &card.evidence {
        out.push_str(&format!("\n   » {} ({}): {}", ev.source, ev.time, ev.text));
    }
    out
}

async fn print_deck(queue: &DeckQueue) {
    let snapshot = queue.snapshot().await;
    let counts = snapshot.counts;
    match (&snapshot.current, snapshot.state) {
        (Some(card), _) => {
            let favorite = snapshot.favorites.iter().any(|id| *id == card.id);
            println!("\n{}", render_card(card, favorite));
        }
        (None, DeckState::Complete) => {
            println!("\n🏆 Deck complete! Type 'done' to review results or 'reset' to start over.");
        }
        (None, DeckState::InProgress) => {
            println!("\nNo {} signals left. Try another filter.", snapshot.filter);
        }
    }
    let collections = queue.collections().await;
    eprintln!(
        "   filter: {} · left: {} · backlog: {} · archive: {} · favorites: {} · xp: {}",
        snapshot.filter,
        counts.remaining,
        collections.backlog_len(),
        collections.archive_len(),
        counts.favorites,
        collections.xp,
    );
}

const HELP: &str = "\
  y / right    backlog the current card
  n / left     archive the current card
  star         toggle favorite on the current card
  filter X     show all | feature | bug
  reset        restore the full deck
  done [why]   hand off to review, with optional argumentation
  show         print the current card
  quit         exit";

/// Why the REPL stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplExit {
    /// The user asked to exit.
    Quit,
    /// Input ran out (stdin closed or redirected from /dev/null).
    Eof,
}

impl ReplExit {
    /// Only an explicit quit takes the server down with the REPL.
    pub fn stops_server(self) -> bool {
        matches!(self, Self::Quit)
    }
}

/// Run the REPL on stdin until EOF or `quit`.
pub async fn run(queue: Arc<DeckQueue>) -> ReplExit {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<String>();

    tokio::spawn(async move {
        let stdin = tokio::io::stdin();
        let mut lines = BufReader::new(stdin).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Ok(None) => break, // EOF
                Err(e) => {
                    tracing::error!("Error reading stdin: {}", e);
                    break;
                }
            }
        }
    });

    let input = stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|line| (line, rx))
    });

    drive(&queue, input).await
}

/// Apply REPL lines from `input` to the queue.
pub async fn drive<S>(queue: &DeckQueue, input: S) -> ReplExit
where
    S: Stream<Item = String>,
{
    let mut input = Box::pin(input);

    print_deck(queue).await;
    eprint!("> ");

    while let Some(line) = input.next().await {
        match parse_command(line.trim()) {
            Ok(Command::Swipe(direction)) => {
                if queue.swipe(direction).await.is_none() {
                    eprintln!("Nothing to triage.");
                }
                print_deck(queue).await;
            }
            Ok(Command::Star) => match queue.current().await {
                Some(card) => {
                    let favorite = queue.toggle_favorite(&card.id).await;
                    eprintln!("{} {}", if favorite { "★ starred" } else { "☆ unstarred" }, card.title);
                }
                None => eprintln!("No current card to star."),
            },
            Ok(Command::Filter(filter)) => {
                queue.set_filter(filter).await;
                print_deck(queue).await;
            }
            Ok(Command::Reset) => {
                queue.reset().await;
                print_deck(queue).await;
            }
            Ok(Command::Done(argumentation)) => match queue.finish_review(argumentation).await {
                Some(handoff) => {
                    let collections = queue.collections().await;
                    println!("\nReview {}:", handoff.review_id);
                    println!("  Backlog ({}):", handoff.backlog);
                    for card in &collections.backlog {
                        println!("    {} {}", card.emoji, card.title);
                    }
                    println!("  Archive ({}):", handoff.archive);
                    for card in &collections.archive {
                        println!("    {} {}", card.emoji, card.title);
                    }
                    if let Some(text) = &handoff.argumentation {
                        println!("  Argumentation: {text}");
                    }
                }
                None => eprintln!("Finish the deck first."),
            },
            Ok(Command::Show) => print_deck(queue).await,
            Ok(Command::Help) => eprintln!("{HELP}"),
            Ok(Command::Quit) => return ReplExit::Quit,
            Err(msg) => eprintln!("{msg}"),
        }
        eprint!("> ");
    }

    ReplExit::Eof
}
