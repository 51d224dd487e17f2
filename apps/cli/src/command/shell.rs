//! Interactive session.
//!
//! Plain text searches by keyword as you type; lines starting with `/` are
//! commands. Results are printed by a task watching the engine state, so a
//! quick follow-up line replaces a search that has not come back yet.

use super::{Command, open_session};
use crate::config::Config;
use crate::error::{Result, error};
use crate::render;
use nvd::Severity;
use search_core::{ANY_SENTINEL, SearchCoordinator, SearchFilters, SearchState};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;

const HELP: &str = "\
  <keywords>          search by keyword
  /severity <level>   filter by CVSS v3 severity (low, medium, high, critical, any)
  /get <CVE-ID>       look up one vulnerability
  /recent [days]      vulnerabilities published recently
  /page <n>           jump to page n
  /next, /prev        move one page
  /clear              reset all filters
  /history            list recent searches
  /forget <term>      remove a term from the history
  /help               show this text
  /quit               leave (Ctrl-D works too)";

#[derive(Debug, Clone, PartialEq)]
enum Input {
    Search(String),
    Severity(Option<Severity>),
    Get(String),
    Recent(Option<u32>),
    Page(u32),
    Next,
    Previous,
    Clear,
    History,
    Forget(String),
    Help,
    Quit,
    Empty,
}

fn parse(line: &str) -> Result<Input> {
    let line = line.trim();
    let Some(command) = line.strip_prefix('/') else {
        return Ok(if line.is_empty() {
            Input::Empty
        } else {
            Input::Search(line.to_string())
        });
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };

    let input = match (name.to_ascii_lowercase().as_str(), arg) {
        ("severity", level) if level.eq_ignore_ascii_case(ANY_SENTINEL) => Input::Severity(None),
        ("severity", level) => Input::Severity(Some(level.parse().map_err(|e| error!("{e}"))?)),
        ("get", "") => return Err(error!("usage: /get <CVE-ID>")),
        ("get", id) => Input::Get(id.to_string()),
        ("recent", "") => Input::Recent(None),
        ("recent", days) => Input::Recent(Some(days.parse()?)),
        ("page", n) => match n.parse::<u32>()? {
            0 => return Err(error!("pages start at 1")),
            n => Input::Page(n - 1),
        },
        ("next", _) => Input::Next,
        ("prev" | "previous", _) => Input::Previous,
        ("clear", _) => Input::Clear,
        ("history", _) => Input::History,
        ("forget", "") => return Err(error!("usage: /forget <term>")),
        ("forget", term) => Input::Forget(term.to_string()),
        ("help" | "?", _) => Input::Help,
        ("quit" | "exit" | "q", _) => Input::Quit,
        (other, _) => return Err(error!("unknown command /{other}, try /help")),
    };
    Ok(input)
}

async fn print_transitions(mut rx: watch::Receiver<SearchState>) {
    let mut was_loading = rx.borrow().loading;
    while rx.changed().await.is_ok() {
        let state = rx.borrow_and_update().clone();
        if state.loading {
            if !was_loading {
                println!("searching...");
            }
        } else if let Some(message) = &state.error {
            eprintln!("error: {message}");
        } else {
            print!("{}", render::results(&state));
        }
        was_loading = state.loading;
    }
}

pub struct ShellCommand {
    config: Config,
}

impl ShellCommand {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    fn handle(&self, coordinator: &SearchCoordinator, input: Input) {
        match input {
            Input::Search(term) => {
                coordinator.search(SearchFilters {
                    keyword_search: Some(term),
                    start_index: Some(0),
                    ..Default::default()
                });
            }
            Input::Severity(level) => {
                let level = level.map_or(ANY_SENTINEL, |s| s.as_str());
                coordinator.search(SearchFilters {
                    cvss_v3_severity: Some(level.to_string()),
                    start_index: Some(0),
                    ..Default::default()
                });
            }
            Input::Get(id) => {
                coordinator.search_by_id(&id);
            }
            Input::Recent(days) => {
                coordinator.get_recent(days.unwrap_or(self.config.recent_days));
            }
            Input::Page(page) => {
                if coordinator.go_to_page(page).is_none() {
                    println!("still loading, try again in a moment");
                }
            }
            Input::Next => {
                if coordinator.next_page().is_none() {
                    println!("no next page");
                }
            }
            Input::Previous => {
                if coordinator.previous_page().is_none() {
                    println!("no previous page");
                }
            }
            Input::Clear => {
                coordinator.clear_filters();
            }
            Input::History => {
                for (i, term) in coordinator.history().entries().iter().enumerate() {
                    println!("{:>2}  {}", i + 1, term);
                }
            }
            Input::Forget(term) => {
                if !coordinator.remove_history(&term) {
                    println!("'{term}' is not in the history");
                }
            }
            Input::Help => println!("{HELP}"),
            Input::Quit | Input::Empty => {}
        }
    }
}

#[async_trait::async_trait]
impl Command for ShellCommand {
    async fn execute(&self) -> Result<()> {
        let (coordinator, store) = open_session(&self.config)?;
        let printer = tokio::spawn(print_transitions(coordinator.subscribe()));
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        println!("{HELP}");
        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            match parse(&line) {
                Ok(Input::Quit) => break,
                Ok(input) => self.handle(&coordinator, input),
                Err(e) => eprintln!("{e}"),
            }
        }

        printer.abort();
        coordinator.cancel();
        store.save(&coordinator.history())
    }
}
