/// A scripted session: an integer counter driven through a history manager.
use std::cell::Cell;
use std::io::{BufRead, Write};
use std::rc::Rc;

use anyhow::{bail, Context, Result};
use undo_redo::{ActionDefinition, Direction, HistoryManager};

use crate::config::CliConfig;
use crate::script::{parse_line, Command};

/// Names of the actions a session registers on startup.
pub const BUILTIN_ACTIONS: &[&str] = &["add", "sub", "mul", "reset"];

/// Counts from one script run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
}

/// Counter state plus the history that mutates it.
pub struct Session {
    value: Rc<Cell<i64>>,
    initial_value: i64,
    history: HistoryManager<i64, i64>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("value", &self.value.get())
            .field("history", &self.history)
            .finish()
    }
}

impl Session {
    /// Creates a session with every built-in action registered.
    pub fn new(config: &CliConfig) -> Self {
        let value = Rc::new(Cell::new(config.initial_value));
        let mut history = HistoryManager::with_config(config.history.clone());
        for name in BUILTIN_ACTIONS {
            if let Some(def) = builtin_action(name, &value, config.initial_value) {
                history.register_action(*name, def);
            }
        }
        Self {
            value,
            initial_value: config.initial_value,
            history,
        }
    }

    /// Current counter value.
    pub fn value(&self) -> i64 {
        self.value.get()
    }

    pub fn history(&self) -> &HistoryManager<i64, i64> {
        &self.history
    }

    /// Applies one command and returns the text to print for it.
    pub fn apply(&mut self, command: Command) -> Result<String> {
        match command {
            Command::Do { action, args } => {
                self.check_forward(&action, &args)?;
                let value = self.history.execute(&action, args)?;
                Ok(value.to_string())
            }
            Command::Undo => Ok(self.history.undo()?.to_string()),
            Command::Redo => Ok(self.history.redo()?.to_string()),
            Command::Register(name) => {
                let def = builtin_action(&name, &self.value, self.initial_value)
                    .with_context(|| format!("no built-in action named '{name}'"))?;
                self.history.register_action(name.clone(), def);
                Ok(format!("registered {name}"))
            }
            Command::Deregister(name) => {
                self.history.deregister_action(&name);
                Ok(format!("deregistered {name}"))
            }
            Command::Status => Ok(format!(
                "value={} undo={} redo={} records={} actions=[{}]",
                self.value(),
                self.history.undo_depth(),
                self.history.redo_depth(),
                self.history.len(),
                self.history.action_names().join(",")
            )),
            Command::Clear => {
                self.history.clear();
                Ok("cleared".to_string())
            }
        }
    }

    /// Fails if running `action` forward from the current value would fail,
    /// so a rejected `do` never reaches history. Unregistered names pass
    /// through for `execute` to report.
    fn check_forward(&self, action: &str, args: &[i64]) -> Result<()> {
        if !self.history.has_action(action) {
            return Ok(());
        }
        match action {
            "reset" => no_args("reset", args),
            _ => counter_step(action, Direction::Forward, self.value(), args).map(|_| ()),
        }
    }

    /// Runs every line of `input`, writing `<line> -> <output>` for each command.
    ///
    /// Failing commands are reported inline and skipped, unless `strict` is
    /// set, in which case the first failure is returned.
    pub fn run_script<R: BufRead, W: Write>(
        &mut self,
        input: R,
        out: &mut W,
        strict: bool,
    ) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        for (index, line) in input.lines().enumerate() {
            let line = line.context("Failed to read script line")?;
            let lineno = index + 1;

            let outcome = match parse_line(&line) {
                Ok(None) => continue,
                Ok(Some(command)) => self.apply(command),
                Err(e) => Err(e),
            };

            match outcome {
                Ok(text) => {
                    summary.succeeded += 1;
                    writeln!(out, "{} -> {text}", line.trim())?;
                }
                Err(e) => {
                    summary.failed += 1;
                    tracing::warn!("Line {lineno} failed: {e:#}");
                    writeln!(out, "{} -> error: {e:#}", line.trim())?;
                    if strict {
                        return Err(e.context(format!("script line {lineno}")));
                    }
                }
            }
        }

        Ok(summary)
    }
}

/// Builds the built-in action called `name` over the shared counter.
fn builtin_action(
    name: &str,
    value: &Rc<Cell<i64>>,
    initial_value: i64,
) -> Option<ActionDefinition<i64, i64>> {
    let def = match name {
        "add" => arithmetic_action("add", value),
        "sub" => arithmetic_action("sub", value),
        "mul" => arithmetic_action("mul", value),
        "reset" => {
            let value = Rc::clone(value);
            ActionDefinition::irreversible(move |args: &[i64]| {
                no_args("reset", args)?;
                value.set(initial_value);
                Ok(initial_value)
            })
        }
        _ => return None,
    };
    Some(def)
}

fn arithmetic_action(action: &'static str, value: &Rc<Cell<i64>>) -> ActionDefinition<i64, i64> {
    let fwd = Rc::clone(value);
    let rev = Rc::clone(value);
    ActionDefinition::new(
        move |args: &[i64]| update(&fwd, action, Direction::Forward, args),
        move |args: &[i64]| update(&rev, action, Direction::Reverse, args),
    )
}

/// Computes the counter after running `action` in `direction` from `current`.
fn counter_step(action: &str, direction: Direction, current: i64, args: &[i64]) -> Result<i64> {
    let n = single_arg(action, args)?;
    let next = match (action, direction) {
        ("add", Direction::Forward) | ("sub", Direction::Reverse) => current.checked_add(n),
        ("sub", Direction::Forward) | ("add", Direction::Reverse) => current.checked_sub(n),
        ("mul", Direction::Forward) => {
            if n == 0 {
                bail!("multiplying by zero cannot be undone");
            }
            current.checked_mul(n)
        }
        ("mul", Direction::Reverse) => {
            if n == 0 {
                bail!("cannot divide the counter by zero");
            }
            current.checked_div(n)
        }
        _ => bail!("{action} is not a counter operation"),
    };
    next.context("counter overflow")
}

fn update(value: &Cell<i64>, action: &str, direction: Direction, args: &[i64]) -> Result<i64> {
    let next = counter_step(action, direction, value.get(), args)?;
    value.set(next);
    Ok(next)
}

fn single_arg(action: &str, args: &[i64]) -> Result<i64> {
    match args {
        [n] => Ok(*n),
        _ => bail!("{action} expects 1 argument, got {}", args.len()),
    }
}

fn no_args(action: &str, args: &[i64]) -> Result<()> {
    if !args.is_empty() {
        bail!("{action} takes no arguments, got {}", args.len());
    }
    Ok(())
}
