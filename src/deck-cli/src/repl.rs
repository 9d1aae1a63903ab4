use deck_core::RequestedPage;
use thiserror::Error;

pub const HELP: &str = "\
commands:
  s <keyword>   search from page 1
  k <text>      set the keyword without searching
  n / p         next / previous page
  g <page>      search the current keyword at a page
  play <n>      select the n-th listed track
  t             toggle playback
  c             clear the search
  l             list again
  q             quit";

/// One line of input at the browse prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Search(String),
    Keyword(String),
    Next,
    Prev,
    Goto(RequestedPage),
    /// One-based position in the displayed list.
    Play(usize),
    Toggle,
    Clear,
    List,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty input")]
    Empty,
    #[error("unknown command '{0}' (type 'h' for help)")]
    Unknown(String),
    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),
    #[error("'{0}' is not a track number")]
    BadIndex(String),
}

pub fn parse_line(line: &str) -> Result<ReplCommand, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(ParseError::Empty);
    }
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    match verb {
        // An empty keyword is a legal search.
        "s" | "search" => Ok(ReplCommand::Search(rest.to_string())),
        "k" | "keyword" => Ok(ReplCommand::Keyword(rest.to_string())),
        "n" | "next" => Ok(ReplCommand::Next),
        "p" | "prev" => Ok(ReplCommand::Prev),
        "g" | "goto" => {
            if rest.is_empty() {
                return Err(ParseError::MissingArgument("g"));
            }
            Ok(ReplCommand::Goto(RequestedPage::parse(rest)))
        }
        "play" => {
            if rest.is_empty() {
                return Err(ParseError::MissingArgument("play"));
            }
            match rest.parse::<usize>() {
                Ok(index) if index >= 1 => Ok(ReplCommand::Play(index)),
                _ => Err(ParseError::BadIndex(rest.to_string())),
            }
        }
        "t" | "toggle" => Ok(ReplCommand::Toggle),
        "c" | "clear" => Ok(ReplCommand::Clear),
        "l" | "list" => Ok(ReplCommand::List),
        "h" | "help" | "?" => Ok(ReplCommand::Help),
        "q" | "quit" | "exit" => Ok(ReplCommand::Quit),
        other => Err(ParseError::Unknown(other.to_string())),
    }
}
