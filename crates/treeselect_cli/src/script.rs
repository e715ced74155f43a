//! Command script grammar for the demo session.
//!
//! # Responsibility
//! - Parse one script line into a `ScriptLine`.
//! - Report malformed lines without aborting the whole script.
//!
//! # Invariants
//! - Blank lines and `#` comments parse to `None`.
//! - `-` stands for "no item" wherever an item name is accepted.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use treeselect_core::{LoggingError, SelectionError, TreeError};

static LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:@v(?P<view>[1-9])\s+)?(?P<verb>[a-z]+)(?:\s+(?P<args>.+))?$")
        .expect("valid script line regex")
});

/// One session command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `select <name>|-`
    Select(Option<String>),
    /// `extend <name>|- [clear]`
    Extend { target: Option<String>, clear: bool },
    /// `set <name>...`; no names clears the selection.
    Set(Vec<String>),
    /// `current <name>|- [select]`
    Current { target: Option<String>, select: bool },
    /// `remove <name>`
    Remove(String),
    /// `reset`
    Reset,
    /// `show`
    Show,
}

/// Parsed script line: a command, optionally issued by one view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLine {
    /// 1-based view number from an `@vN` prefix.
    pub view: Option<usize>,
    pub command: Command,
}

#[derive(Debug)]
pub enum ScriptError {
    /// Line does not match the command grammar.
    Malformed(String),
    UnknownCommand(String),
    /// Command got the wrong number or kind of arguments.
    BadArguments { verb: &'static str, usage: &'static str },
    UnknownView(usize),
    UnknownItem(String),
    Selection(SelectionError),
    Tree(TreeError),
    Logging(LoggingError),
    Io(std::io::Error),
}

impl Display for ScriptError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(line) => write!(f, "cannot parse line `{line}`"),
            Self::UnknownCommand(verb) => write!(f, "unknown command `{verb}`"),
            Self::BadArguments { verb, usage } => {
                write!(f, "bad arguments for `{verb}`; usage: {usage}")
            }
            Self::UnknownView(view) => write!(f, "no such view: v{view}"),
            Self::UnknownItem(name) => write!(f, "no such item: {name}"),
            Self::Selection(err) => write!(f, "selection error: {err}"),
            Self::Tree(err) => write!(f, "tree error: {err}"),
            Self::Logging(err) => write!(f, "logging error: {err}"),
            Self::Io(err) => write!(f, "io error: {err}"),
        }
    }
}

impl Error for ScriptError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Selection(err) => Some(err),
            Self::Tree(err) => Some(err),
            Self::Logging(err) => Some(err),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SelectionError> for ScriptError {
    fn from(value: SelectionError) -> Self {
        Self::Selection(value)
    }
}

impl From<TreeError> for ScriptError {
    fn from(value: TreeError) -> Self {
        Self::Tree(value)
    }
}

impl From<LoggingError> for ScriptError {
    fn from(value: LoggingError) -> Self {
        Self::Logging(value)
    }
}

impl From<std::io::Error> for ScriptError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Parses one script line. Returns `Ok(None)` for blank and comment lines.
pub fn parse_line(line: &str) -> Result<Option<ScriptLine>, ScriptError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let captures = LINE_RE
        .captures(line)
        .ok_or_else(|| ScriptError::Malformed(line.to_string()))?;

    let view = captures
        .name("view")
        .and_then(|view| view.as_str().parse::<usize>().ok());
    let args: Vec<&str> = captures
        .name("args")
        .map(|args| args.as_str().split_whitespace().collect())
        .unwrap_or_default();

    let command = match &captures["verb"] {
        "select" => match args.as_slice() {
            [target] => Command::Select(item_arg(target)),
            _ => return Err(bad("select", "select <name>|-")),
        },
        "extend" => match args.as_slice() {
            [target] => Command::Extend {
                target: item_arg(target),
                clear: false,
            },
            [target, "clear"] => Command::Extend {
                target: item_arg(target),
                clear: true,
            },
            _ => return Err(bad("extend", "extend <name>|- [clear]")),
        },
        "set" => Command::Set(args.iter().map(|name| name.to_string()).collect()),
        "current" => match args.as_slice() {
            [target] => Command::Current {
                target: item_arg(target),
                select: false,
            },
            [target, "select"] => Command::Current {
                target: item_arg(target),
                select: true,
            },
            _ => return Err(bad("current", "current <name>|- [select]")),
        },
        "remove" => match args.as_slice() {
            [name] if *name != "-" => Command::Remove(name.to_string()),
            _ => return Err(bad("remove", "remove <name>")),
        },
        "reset" if args.is_empty() => Command::Reset,
        "reset" => return Err(bad("reset", "reset")),
        "show" if args.is_empty() => Command::Show,
        "show" => return Err(bad("show", "show")),
        other => return Err(ScriptError::UnknownCommand(other.to_string())),
    };

    Ok(Some(ScriptLine { view, command }))
}

fn item_arg(value: &str) -> Option<String> {
    (value != "-").then(|| value.to_string())
}

fn bad(verb: &'static str, usage: &'static str) -> ScriptError {
    ScriptError::BadArguments { verb, usage }
}
