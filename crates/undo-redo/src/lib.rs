/// In-memory undo/redo coordination for named, reversible actions.
///
/// Callers register actions (a forward and a reverse handler under a name)
/// with a `HistoryManager`, run them through `execute`, and then walk the
/// resulting linear history with `undo` and `redo`. Executing a new action
/// after undoing discards the redoable future.
pub mod action;
pub mod config;
pub mod error;
pub mod manager;
pub mod record;

pub use action::{ActionDefinition, Direction, Handler};
pub use config::HistoryConfig;
pub use error::{HistoryError, Result};
pub use manager::HistoryManager;
pub use record::{HistoryRecord, HistoryStore, RecordId};
