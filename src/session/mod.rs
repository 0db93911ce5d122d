//! Interactive leaderboard session: one stdin line per UI event.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::board::Board;
use crate::engine::{FilterState, Leaderboard, TypeSelection};
use crate::output::{self, Report};

pub const HELP: &str = "commands:
  search <term>   filter names (empty term clears)
  type <prefix>   toggle an assignment type
  all | none      select every type / clear the selection
  open <n|name>   expand or collapse one row
  types           list assignment types
  show            print the current view
  help            this text
  quit            leave
";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Search(String),
    ToggleType(String),
    SelectAll,
    SelectNone,
    Open(String),
    Types,
    Show,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim_end_matches(['\r', '\n']);
    let trimmed = line.trim_start();
    let (word, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim_start()),
        None => (trimmed, ""),
    };
    match word.to_ascii_lowercase().as_str() {
        "search" | "s" => Ok(Command::Search(rest.to_string())),
        "type" | "t" => {
            let prefix = rest.trim();
            if prefix.is_empty() {
                return Err("usage: type <prefix>".to_string());
            }
            Ok(Command::ToggleType(prefix.to_string()))
        }
        "all" => Ok(Command::SelectAll),
        "none" => Ok(Command::SelectNone),
        "open" | "o" => {
            let target = rest.trim();
            if target.is_empty() {
                return Err("usage: open <rank|name>".to_string());
            }
            Ok(Command::Open(target.to_string()))
        }
        "types" => Ok(Command::Types),
        "show" | "" => Ok(Command::Show),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        other => Err(format!("unknown command '{other}' (try 'help')")),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Render,
    Message(String),
    Quit,
}

#[derive(Clone, Debug)]
pub struct Session {
    board: Board,
    filter: FilterState,
    leaderboard: Leaderboard,
}

impl Session {
    pub fn new(board: Board, filter: FilterState) -> Self {
        let leaderboard = board.leaderboard(&filter);
        Self {
            board,
            filter,
            leaderboard,
        }
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    /// Opens every detail panel of the current view until the next recompute.
    pub fn expand_all(&mut self) {
        self.leaderboard.expand_all();
    }

    pub fn report(&self) -> Report {
        Report::ready(&self.board, &self.filter, self.leaderboard.clone())
    }

    /// Full recompute; discards any row toggles.
    fn refresh(&mut self) {
        self.leaderboard = self.board.leaderboard(&self.filter);
        debug!(
            "recomputed leaderboard: {} rows, mode {:?}",
            self.leaderboard.rows.len(),
            self.leaderboard.mode
        );
    }

    pub fn set_search(&mut self, term: &str) {
        self.filter.search = term.to_string();
        self.refresh();
    }

    pub fn toggle_type(&mut self, prefix: &str) -> bool {
        let selected = self.filter.types.toggle(prefix);
        self.refresh();
        selected
    }

    pub fn select_all(&mut self) {
        self.filter.types = TypeSelection::all(self.board.dataset());
        self.refresh();
    }

    pub fn select_none(&mut self) {
        self.filter.types = TypeSelection::none();
        self.refresh();
    }

    pub fn open(&mut self, target: &str) -> Option<bool> {
        let index = self.leaderboard.find(target)?;
        self.leaderboard.toggle(index)
    }

    fn types_listing(&self) -> String {
        let mut out = String::new();
        for t in self.board.assignment_types() {
            let mark = if self.filter.types.contains(t) { "x" } else { " " };
            out.push_str(&format!("[{mark}] {t}\n"));
        }
        for t in self.filter.types.iter() {
            if !self.board.assignment_types().iter().any(|known| known == t) {
                out.push_str(&format!("[x] {t} (no matching assignments)\n"));
            }
        }
        if out.is_empty() {
            out.push_str("no assignment types in dataset\n");
        }
        out
    }

    pub fn apply(&mut self, command: Command) -> Outcome {
        match command {
            Command::Search(term) => {
                self.set_search(&term);
                Outcome::Render
            }
            Command::ToggleType(prefix) => {
                self.toggle_type(&prefix);
                Outcome::Render
            }
            Command::SelectAll => {
                self.select_all();
                Outcome::Render
            }
            Command::SelectNone => {
                self.select_none();
                Outcome::Render
            }
            Command::Open(target) => match self.open(&target) {
                Some(_) => Outcome::Render,
                None => Outcome::Message(format!("no row '{target}' in the current view\n")),
            },
            Command::Types => Outcome::Message(self.types_listing()),
            Command::Show => Outcome::Render,
            Command::Help => Outcome::Message(HELP.to_string()),
            Command::Quit => Outcome::Quit,
        }
    }
}

/// Reads commands until `quit` or end of input, writing each resulting view.
pub async fn run<R, W>(
    session: &mut Session,
    reader: R,
    mut writer: W,
    color: bool,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    writer
        .write_all(&output::render_text(&session.report(), color))
        .await?;
    writer.flush().await?;

    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let outcome = match parse_command(&line) {
            Ok(command) => session.apply(command),
            Err(message) => Outcome::Message(format!("{message}\n")),
        };
        match outcome {
            Outcome::Render => {
                writer.write_all(b"\n").await?;
                writer
                    .write_all(&output::render_leaderboard_text(session.leaderboard(), color).into_bytes())
                    .await?;
            }
            Outcome::Message(message) => writer.write_all(message.as_bytes()).await?,
            Outcome::Quit => break,
        }
        writer.flush().await?;
    }
    writer.flush().await
}
