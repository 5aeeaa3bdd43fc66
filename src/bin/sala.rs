//! Kalyana terminal client
//!
//! Line-oriented front end over [`SessionController`]. Plain lines are sent
//! as turns; a few slash commands drive the rest of the session.

use kalyana::config::ClientConfig;
use kalyana::session::{
    HttpGatewayClient, Phase, Role, SessionController, SessionError, SqliteHistoryStore, Turn,
};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

type Controller = SessionController<SqliteHistoryStore, HttpGatewayClient>;

const HELP: &str = "/end  close the session   /resume  reopen it   /reset  forget everything   /quit  leave";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so they do not interleave with the conversation
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kalyana=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ClientConfig::from_env();
    if let Some(parent) = config.db_path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            tracing::warn!(path = %parent.display(), error = %e, "Cannot create history directory");
        }
    }

    let store = SqliteHistoryStore::open_or_memory(&config.db_path)?;
    let gateway = HttpGatewayClient::new(config.gateway_url.clone());
    let controller = Controller::open(store, gateway);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut shown = 0;

    show_entrance();
    loop {
        prompt(controller.phase())?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();

        let restoring = controller.phase() == Phase::Entering;
        let outcome = match Command::parse(controller.phase(), line) {
            Command::Quit => break,
            Command::Help => {
                println!("{HELP}");
                continue;
            }
            Command::Reset => {
                controller.reset();
                shown = 0;
                show_entrance();
                continue;
            }
            Command::Begin => {
                println!("\n  ...\n");
                controller.begin().await
            }
            Command::End => controller.end().await,
            Command::Resume => controller.resume(),
            Command::Submit(text) => controller.submit(text).await,
            Command::Unavailable(hint) => {
                println!("{hint}");
                continue;
            }
        };

        shown = render_new(&controller, shown, restoring);
        report(&controller, outcome);
    }

    Ok(())
}

/// What one input line asks for
#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Quit,
    Help,
    Reset,
    Begin,
    End,
    Resume,
    Submit(&'a str),
    /// Not valid right now; carries the hint to show
    Unavailable(&'static str),
}

const ENTRANCE_HINT: &str = "Press Enter to come in, or /reset to begin fresh.";
const CLOSED_HINT: &str = "The session is closed. /resume to continue or /reset to start over.";

impl<'a> Command<'a> {
    /// Interpret a trimmed input line in the given phase.
    ///
    /// Slash commands are recognised in every phase; plain input enters the
    /// session at the entrance and is a turn once inside.
    fn parse(phase: Phase, line: &'a str) -> Self {
        match (phase, line) {
            (_, "/quit") => Self::Quit,
            (_, "/help") => Self::Help,
            (_, "/reset") => Self::Reset,
            (Phase::Entering, l) if l.starts_with('/') => Self::Unavailable(ENTRANCE_HINT),
            (Phase::Entering, _) => Self::Begin,
            (_, "/end") => Self::End,
            (_, "/resume") => Self::Resume,
            (Phase::Closed, _) => Self::Unavailable(CLOSED_HINT),
            (Phase::Active, text) => Self::Submit(text),
        }
    }
}

fn show_entrance() {
    println!();
    println!("  K A L Y A N A");
    println!("  a quiet room for what you are carrying");
    println!();
    println!("  {ENTRANCE_HINT}");
    println!("  {HELP}");
    println!();
}

fn prompt(phase: Phase) -> std::io::Result<()> {
    let marker = match phase {
        Phase::Entering => "enter",
        Phase::Active => "you",
        Phase::Closed => "closed",
    };
    print!("{marker}> ");
    std::io::stdout().flush()
}

/// Print turns added since the last render; returns the new count
fn render_new(controller: &Controller, shown: usize, echo_user: bool) -> usize {
    let state = controller.snapshot();
    for turn in state.turns.iter().skip(shown) {
        match turn.role {
            Role::Assistant => render_turn(turn),
            // Typed turns are already on screen unless restored from history
            Role::User if echo_user => println!("you: {}", turn.content),
            Role::User => {}
        }
    }
    if state.phase == Phase::Closed && state.turns.len() > shown {
        println!("  The session has ended. /resume to continue or /reset to start over.\n");
    }
    state.turns.len()
}

fn render_turn(turn: &Turn) {
    let reply = turn.reply();
    println!();
    for line in reply.main.lines() {
        println!("  {line}");
    }
    if reply.has_citation() {
        println!("\n      —");
        for line in reply.citation.lines() {
            println!("      {line}");
        }
        for link in reply.citation_links() {
            println!("      <{link}>");
        }
    }
    if turn.closing {
        println!("\n  ~ closing ~");
    }
    println!();
}

fn report(controller: &Controller, outcome: Result<(), SessionError>) {
    if let Err(e) = outcome {
        if !e.is_silent() {
            match controller.snapshot().error {
                Some(message) => eprintln!("! {message}"),
                None => eprintln!("! {e}"),
            }
        }
    }
    controller.dismiss_error();
}
