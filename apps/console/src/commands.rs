//! Interactive commands typed at the console prompt.

use std::str::FromStr;

use thiserror::Error;

pub const HELP: &str = "\
commands:
  next | prev              move one page forward or back
  page N                   jump to page N
  limit N                  show N rows per page (back to page 1)
  filter KEY=VALUE ...     add or change filters (back to page 1)
  clear                    drop all filters and sorting (back to page 1)
  sort KEY[:asc|desc]      sort by KEY (back to page 1)
  refresh                  reload the current page
  delete ID                delete an item on the server
  status ID VALUE          change an item's status on the server
  help                     show this text
  quit                     leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Next,
    Prev,
    Page(u32),
    Limit(u32),
    Filter(Vec<String>),
    Clear,
    Sort(String),
    Refresh,
    Delete(String),
    Status { id: String, value: String },
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command `{0}` (try `help`)")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
}

fn number(arg: Option<&str>, usage: &'static str) -> Result<u32, CommandError> {
    arg.and_then(|raw| raw.parse().ok())
        .ok_or(CommandError::Usage(usage))
}

impl FromStr for ConsoleCommand {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Err(CommandError::Empty);
        };
        let args: Vec<&str> = words.collect();

        let command = match head.to_ascii_lowercase().as_str() {
            "next" | "n" => ConsoleCommand::Next,
            "prev" | "p" => ConsoleCommand::Prev,
            "page" => ConsoleCommand::Page(number(args.first().copied(), "page N")?),
            "limit" => ConsoleCommand::Limit(number(args.first().copied(), "limit N")?),
            "filter" if !args.is_empty() => {
                ConsoleCommand::Filter(args.iter().map(|arg| arg.to_string()).collect())
            }
            "filter" => return Err(CommandError::Usage("filter KEY=VALUE ...")),
            "clear" => ConsoleCommand::Clear,
            "sort" => match args.as_slice() {
                [spec] => ConsoleCommand::Sort(spec.to_string()),
                _ => return Err(CommandError::Usage("sort KEY[:asc|desc]")),
            },
            "refresh" | "r" => ConsoleCommand::Refresh,
            "delete" | "rm" => match args.as_slice() {
                [id] => ConsoleCommand::Delete(id.to_string()),
                _ => return Err(CommandError::Usage("delete ID")),
            },
            "status" => match args.as_slice() {
                [id, value] => ConsoleCommand::Status {
                    id: id.to_string(),
                    value: value.to_string(),
                },
                _ => return Err(CommandError::Usage("status ID VALUE")),
            },
            "help" | "?" => ConsoleCommand::Help,
            "quit" | "exit" | "q" => ConsoleCommand::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}
