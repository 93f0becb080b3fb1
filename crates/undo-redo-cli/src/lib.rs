/// Scripted host for the undo/redo history manager.
///
/// Drives a `HistoryManager` over an integer counter from a line-oriented
/// command script.
pub mod config;
pub mod script;
pub mod session;

pub use config::CliConfig;
pub use script::{parse_line, Command};
pub use session::{RunSummary, Session, BUILTIN_ACTIONS};
