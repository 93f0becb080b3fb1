/// Action definitions: named pairs of forward/reverse handlers.
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// A handler invoked with a record's stored argument list.
///
/// Handlers are shared (`Rc`) so a registry can be copied into a new
/// manager without cloning the closures themselves.
pub type Handler<A, R> = Rc<dyn Fn(&[A]) -> anyhow::Result<R>>;

/// Which side of an action to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Apply the action (`do` and `redo`).
    Forward,
    /// Revert the action (`undo`).
    Reverse,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forward => f.write_str("forward"),
            Self::Reverse => f.write_str("reverse"),
        }
    }
}

/// A pair of handlers registered under an action name.
///
/// Either side may be absent. A missing side is only reported when it is
/// dispatched, so an action without a reverse can still be executed and
/// redone; undoing it fails with `MissingHandler`.
pub struct ActionDefinition<A, R> {
    forward: Option<Handler<A, R>>,
    reverse: Option<Handler<A, R>>,
}

impl<A, R> ActionDefinition<A, R> {
    /// Creates a definition with both a forward and a reverse handler.
    pub fn new<F, U>(forward: F, reverse: U) -> Self
    where
        F: Fn(&[A]) -> anyhow::Result<R> + 'static,
        U: Fn(&[A]) -> anyhow::Result<R> + 'static,
    {
        Self {
            forward: Some(Rc::new(forward)),
            reverse: Some(Rc::new(reverse)),
        }
    }

    /// Creates a definition that can be applied but not reverted.
    pub fn irreversible<F>(forward: F) -> Self
    where
        F: Fn(&[A]) -> anyhow::Result<R> + 'static,
    {
        Self {
            forward: Some(Rc::new(forward)),
            reverse: None,
        }
    }

    /// Creates a definition from optional, already-shared handlers.
    pub fn from_parts(forward: Option<Handler<A, R>>, reverse: Option<Handler<A, R>>) -> Self {
        Self { forward, reverse }
    }

    /// Returns the handler for `direction`, if one was supplied.
    pub fn handler(&self, direction: Direction) -> Option<&Handler<A, R>> {
        match direction {
            Direction::Forward => self.forward.as_ref(),
            Direction::Reverse => self.reverse.as_ref(),
        }
    }

    /// Whether both sides are present.
    pub fn is_reversible(&self) -> bool {
        self.forward.is_some() && self.reverse.is_some()
    }
}

// Manual impls: deriving would require `A: Clone` / `R: Clone`.
impl<A, R> Clone for ActionDefinition<A, R> {
    fn clone(&self) -> Self {
        Self {
            forward: self.forward.clone(),
            reverse: self.reverse.clone(),
        }
    }
}

impl<A, R> fmt::Debug for ActionDefinition<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDefinition")
            .field("forward", &self.forward.is_some())
            .field("reverse", &self.reverse.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_has_both_sides() {
        let def: ActionDefinition<i64, i64> =
            ActionDefinition::new(|args: &[i64]| Ok(args[0]), |args: &[i64]| Ok(-args[0]));
        assert!(def.is_reversible());

        let forward = def.handler(Direction::Forward).expect("forward");
        let reverse = def.handler(Direction::Reverse).expect("reverse");
        assert_eq!(forward(&[3]).unwrap(), 3);
        assert_eq!(reverse(&[3]).unwrap(), -3);
    }

    #[test]
    fn test_irreversible_has_no_reverse() {
        let def: ActionDefinition<i64, ()> = ActionDefinition::irreversible(|_| Ok(()));
        assert!(!def.is_reversible());
        assert!(def.handler(Direction::Forward).is_some());
        assert!(def.handler(Direction::Reverse).is_none());
    }

    #[test]
    fn test_clone_shares_handlers() {
        let def: ActionDefinition<i64, i64> =
            ActionDefinition::new(|args: &[i64]| Ok(args.len() as i64), |_| Ok(0));
        let copy = def.clone();
        let a = def.handler(Direction::Forward).unwrap();
        let b = copy.handler(Direction::Forward).unwrap();
        assert!(Rc::ptr_eq(a, b));
    }

    #[test]
    fn test_direction_display_and_serde() {
        assert_eq!(Direction::Forward.to_string(), "forward");
        assert_eq!(Direction::Reverse.to_string(), "reverse");
        let json = serde_json::to_string(&Direction::Reverse).unwrap();
        assert_eq!(json, "\"reverse\"");
    }

    #[test]
    fn test_debug_reports_sides() {
        let def: ActionDefinition<u8, ()> = ActionDefinition::from_parts(None, None);
        assert_eq!(
            format!("{def:?}"),
            "ActionDefinition { forward: false, reverse: false }"
        );
    }
}
