/// History error types.
use thiserror::Error;

use crate::action::Direction;

/// Errors returned by [`HistoryManager`](crate::HistoryManager) operations.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// The named action is not in the registry.
    #[error("no such action: {0}")]
    UnknownAction(String),

    /// `undo` was called with no current record.
    #[error("can not undo: no previous action")]
    NoPreviousAction,

    /// `redo` was called with no pending next record.
    #[error("can not redo: no next action")]
    NoNextAction,

    /// The action is registered but has no handler for this direction.
    #[error("action '{action}' has no {direction} handler")]
    MissingHandler { action: String, direction: Direction },

    /// A registered handler returned an error.
    #[error("{direction} handler of action '{action}' failed")]
    Handler {
        action: String,
        direction: Direction,
        #[source]
        source: anyhow::Error,
    },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HistoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_match_reference_text() {
        assert_eq!(
            HistoryError::UnknownAction("add".to_string()).to_string(),
            "no such action: add"
        );
        assert_eq!(
            HistoryError::NoPreviousAction.to_string(),
            "can not undo: no previous action"
        );
        assert_eq!(
            HistoryError::NoNextAction.to_string(),
            "can not redo: no next action"
        );
    }

    #[test]
    fn test_missing_handler_message() {
        let err = HistoryError::MissingHandler {
            action: "reset".to_string(),
            direction: Direction::Reverse,
        };
        assert_eq!(err.to_string(), "action 'reset' has no reverse handler");
    }

    #[test]
    fn test_handler_error_keeps_source() {
        let err = HistoryError::Handler {
            action: "add".to_string(),
            direction: Direction::Forward,
            source: anyhow::anyhow!("overflow"),
        };
        assert_eq!(err.to_string(), "forward handler of action 'add' failed");
        let source = std::error::Error::source(&err).expect("source");
        assert_eq!(source.to_string(), "overflow");
    }
}
