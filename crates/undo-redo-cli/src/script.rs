/// Line-oriented command script parsing.
use std::str::FromStr;

use anyhow::{bail, Context, Result};

/// One command in a session script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `do <action> [int...]`
    Do { action: String, args: Vec<i64> },
    /// `undo`
    Undo,
    /// `redo`
    Redo,
    /// `register <action>`: (re)registers a built-in action.
    Register(String),
    /// `deregister <action>`
    Deregister(String),
    /// `status`
    Status,
    /// `clear`: forgets all history.
    Clear,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut words = s.split_whitespace();
        let Some(keyword) = words.next() else {
            bail!("empty command");
        };

        let command = match keyword {
            "do" => {
                let action = words.next().context("'do' needs an action name")?.to_string();
                let args = words
                    .map(|w| {
                        w.parse::<i64>()
                            .with_context(|| format!("invalid integer argument '{w}'"))
                    })
                    .collect::<Result<Vec<_>>>()?;
                return Ok(Command::Do { action, args });
            }
            "undo" => Command::Undo,
            "redo" => Command::Redo,
            "status" => Command::Status,
            "clear" => Command::Clear,
            "register" | "deregister" => {
                let name = words
                    .next()
                    .with_context(|| format!("'{keyword}' needs an action name"))?
                    .to_string();
                if keyword == "register" {
                    Command::Register(name)
                } else {
                    Command::Deregister(name)
                }
            }
            other => bail!("unknown command '{other}'"),
        };

        if let Some(extra) = words.next() {
            bail!("unexpected argument '{extra}' after '{keyword}'");
        }
        Ok(command)
    }
}

/// Parses one script line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Command>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    trimmed.parse().map(Some)
}
