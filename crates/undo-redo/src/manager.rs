/// The undo/redo history manager.
///
/// Executed actions are kept as a doubly-linked chain of records in an
/// arena, with a cursor made of two optional ids: `current` (the last
/// applied record) and `next` (the record `redo` would reapply).
use std::collections::HashMap;
use std::fmt;

use crate::action::{ActionDefinition, Direction};
use crate::config::HistoryConfig;
use crate::error::{HistoryError, Result};
use crate::record::{HistoryRecord, HistoryStore, RecordId};

/// Records executed actions and walks backward and forward through them.
///
/// `A` is the element type of the argument list captured by each record and
/// `R` is what handlers return. One manager holds exactly one linear history.
///
/// Handlers run inline while the manager is mutably borrowed, so a handler
/// cannot call back into the same manager unless the caller wraps it in
/// interior mutability. Such reentrant use is unsupported.
pub struct HistoryManager<A, R> {
    /// Registered actions by name.
    actions: HashMap<String, ActionDefinition<A, R>>,
    /// Every record still held, reachable or not.
    store: HistoryStore<A>,
    /// Most recently applied record.
    current: Option<RecordId>,
    /// Record that `redo` would reapply. Only set after an undo.
    next: Option<RecordId>,
    config: HistoryConfig,
}

impl<A, R> fmt::Debug for HistoryManager<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.actions.keys().collect();
        names.sort();
        f.debug_struct("HistoryManager")
            .field("actions", &names)
            .field("records", &self.store.len())
            .field("current", &self.current)
            .field("next", &self.next)
            .field("config", &self.config)
            .finish()
    }
}

impl<A, R> Default for HistoryManager<A, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, R> HistoryManager<A, R> {
    /// Creates a manager with no actions and an empty history.
    pub fn new() -> Self {
        Self::with_config(HistoryConfig::default())
    }

    /// Creates an empty manager with the given configuration.
    pub fn with_config(config: HistoryConfig) -> Self {
        Self {
            actions: HashMap::new(),
            store: HistoryStore::new(),
            current: None,
            next: None,
            config,
        }
    }

    /// Creates a manager with an initial set of actions.
    pub fn with_actions<I, S>(actions: I) -> Self
    where
        I: IntoIterator<Item = (S, ActionDefinition<A, R>)>,
        S: Into<String>,
    {
        let mut manager = Self::new();
        for (name, definition) in actions {
            manager.register_action(name, definition);
        }
        manager
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// Registers `definition` under `name`, replacing any previous one.
    ///
    /// Existing records with this name dispatch to the new definition
    /// from now on.
    pub fn register_action(&mut self, name: impl Into<String>, definition: ActionDefinition<A, R>) {
        let name = name.into();
        if self.actions.insert(name.clone(), definition).is_some() {
            tracing::debug!("Replaced action '{name}'");
        } else {
            tracing::debug!("Registered action '{name}'");
        }
    }

    /// Removes the action registered under `name`. No-op if absent.
    ///
    /// Records already created for it stay in history but fail to replay
    /// with `UnknownAction` until the name is registered again.
    pub fn deregister_action(&mut self, name: &str) {
        if self.actions.remove(name).is_some() {
            tracing::debug!("Deregistered action '{name}'");
        }
    }

    pub fn has_action(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    /// Registered action names, sorted.
    pub fn action_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.actions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Executes `name` with `args` and records it in history.
    ///
    /// Appending from a non-tip position discards the redoable future.
    /// History is updated before the forward handler runs, so it stays
    /// consistent even if the handler fails.
    ///
    /// # Errors
    ///
    /// `UnknownAction` if `name` is not registered; nothing is recorded in
    /// that case. Handler failures are returned after the record is kept.
    pub fn execute(&mut self, name: &str, args: Vec<A>) -> Result<R> {
        if !self.actions.contains_key(name) {
            return Err(HistoryError::UnknownAction(name.to_string()));
        }

        if let Some(head) = self.next.take() {
            if self.config.reclaim_detached {
                let removed = self.store.remove_chain(head);
                tracing::debug!("Discarded {removed} redoable record(s) starting at {head}");
            } else {
                tracing::debug!("Detached redoable branch starting at {head}");
            }
        }

        let record = self.store.append(name.to_string(), args, self.current);
        self.current = Some(record.id());
        tracing::debug!("Executed '{name}' as {}", record.id());

        dispatch(&self.actions, record.action(), Direction::Forward, record.args())
    }

    /// Reverts the current record and steps back one position.
    ///
    /// # Errors
    ///
    /// `NoPreviousAction` if there is nothing to undo; nothing changes then.
    /// Dispatch failures are returned after the cursor has moved.
    pub fn undo(&mut self) -> Result<R> {
        let id = self.current.ok_or(HistoryError::NoPreviousAction)?;
        let record = self.store.get(id).ok_or(HistoryError::NoPreviousAction)?;

        self.next = Some(id);
        self.current = record.previous();
        tracing::debug!("Undoing '{}' ({id})", record.action());

        dispatch(&self.actions, record.action(), Direction::Reverse, record.args())
    }

    /// Reapplies the most recently undone record.
    ///
    /// # Errors
    ///
    /// `NoNextAction` if nothing is pending; nothing changes then.
    /// Dispatch failures are returned after the cursor has moved.
    pub fn redo(&mut self) -> Result<R> {
        let id = self.next.ok_or(HistoryError::NoNextAction)?;
        let record = self.store.get(id).ok_or(HistoryError::NoNextAction)?;

        self.current = Some(id);
        self.next = record.next();
        tracing::debug!("Redoing '{}' ({id})", record.action());

        dispatch(&self.actions, record.action(), Direction::Forward, record.args())
    }

    pub fn can_undo(&self) -> bool {
        self.current.is_some()
    }

    pub fn can_redo(&self) -> bool {
        self.next.is_some()
    }

    /// The most recently applied record.
    pub fn current_record(&self) -> Option<&HistoryRecord<A>> {
        self.current.and_then(|id| self.store.get(id))
    }

    /// The record `redo` would reapply.
    pub fn next_record(&self) -> Option<&HistoryRecord<A>> {
        self.next.and_then(|id| self.store.get(id))
    }

    /// Looks up any record still held by the manager.
    pub fn record(&self, id: RecordId) -> Option<&HistoryRecord<A>> {
        self.store.get(id)
    }

    /// Number of `undo` calls that would succeed in a row.
    pub fn undo_depth(&self) -> usize {
        self.store.ancestors_of(self.current).count()
    }

    /// Number of `redo` calls that would succeed in a row.
    pub fn redo_depth(&self) -> usize {
        self.store.chain_from(self.next).count()
    }

    /// Applied records, oldest first, ending at the current one.
    pub fn applied(&self) -> Vec<&HistoryRecord<A>> {
        let mut records: Vec<_> = self.store.ancestors_of(self.current).collect();
        records.reverse();
        records
    }

    /// Records held in the arena, including detached ones not yet reclaimed.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Forgets all history. Registered actions are kept.
    pub fn clear(&mut self) {
        self.store.clear();
        self.current = None;
        self.next = None;
        tracing::debug!("Cleared history");
    }
}

/// Runs the `direction` handler of `action` with `args`.
fn dispatch<A, R>(
    actions: &HashMap<String, ActionDefinition<A, R>>,
    action: &str,
    direction: Direction,
    args: &[A],
) -> Result<R> {
    let Some(definition) = actions.get(action) else {
        tracing::warn!("Cannot run {direction} of '{action}': action is not registered");
        return Err(HistoryError::UnknownAction(action.to_string()));
    };
    let handler = definition
        .handler(direction)
        .ok_or_else(|| HistoryError::MissingHandler {
            action: action.to_string(),
            direction,
        })?;

    tracing::trace!("Dispatching {direction} of '{action}' with {} arg(s)", args.len());
    handler(args).map_err(|source| HistoryError::Handler {
        action: action.to_string(),
        direction,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Shared log of `(direction, args)` calls made by test handlers.
    type CallLog = Rc<RefCell<Vec<(Direction, Vec<i64>)>>>;

    fn logging_action(log: &CallLog) -> ActionDefinition<i64, usize> {
        let fwd = Rc::clone(log);
        let rev = Rc::clone(log);
        ActionDefinition::new(
            move |args: &[i64]| {
                fwd.borrow_mut().push((Direction::Forward, args.to_vec()));
                Ok(fwd.borrow().len())
            },
            move |args: &[i64]| {
                rev.borrow_mut().push((Direction::Reverse, args.to_vec()));
                Ok(rev.borrow().len())
            },
        )
    }

    fn manager_with_log() -> (HistoryManager<i64, usize>, CallLog) {
        let log: CallLog = Rc::new(RefCell::new(Vec::new()));
        let mgr = HistoryManager::with_actions([("op", logging_action(&log))]);
        (mgr, log)
    }

    #[test]
    fn test_new_manager_is_empty() {
        let mgr: HistoryManager<i64, ()> = HistoryManager::new();
        assert!(mgr.is_empty());
        assert!(!mgr.can_undo());
        assert!(!mgr.can_redo());
        assert!(mgr.current_record().is_none());
        assert!(mgr.next_record().is_none());
        assert!(mgr.action_names().is_empty());
    }

    #[test]
    fn test_execute_links_records() {
        let (mut mgr, _) = manager_with_log();
        mgr.execute("op", vec![1]).unwrap();
        let first = mgr.current_record().unwrap().id();
        mgr.execute("op", vec![2]).unwrap();
        let second = mgr.current_record().unwrap();

        assert_eq!(second.previous(), Some(first));
        assert_eq!(mgr.record(first).unwrap().next(), Some(second.id()));
        assert_eq!(second.args(), &[2]);
    }

    #[test]
    fn test_execute_returns_handler_result() {
        let (mut mgr, log) = manager_with_log();
        assert_eq!(mgr.execute("op", vec![7]).unwrap(), 1);
        assert_eq!(log.borrow().as_slice(), &[(Direction::Forward, vec![7])]);
    }

    #[test]
    fn test_undo_moves_cursor_back() {
        let (mut mgr, _) = manager_with_log();
        mgr.execute("op", vec![1]).unwrap();
        let first = mgr.current_record().unwrap().id();
        mgr.execute("op", vec![2]).unwrap();
        let second = mgr.current_record().unwrap().id();

        mgr.undo().unwrap();
        assert_eq!(mgr.current_record().unwrap().id(), first);
        assert_eq!(mgr.next_record().unwrap().id(), second);

        mgr.undo().unwrap();
        assert!(mgr.current_record().is_none());
        assert_eq!(mgr.next_record().unwrap().id(), first);
        assert!(!mgr.can_undo());
    }

    #[test]
    fn test_redo_follows_forward_links() {
        let (mut mgr, log) = manager_with_log();
        mgr.execute("op", vec![1]).unwrap();
        mgr.execute("op", vec![2]).unwrap();
        mgr.undo().unwrap();
        mgr.undo().unwrap();

        mgr.redo().unwrap();
        assert_eq!(mgr.current_record().unwrap().args(), &[1]);
        assert_eq!(mgr.next_record().unwrap().args(), &[2]);
        mgr.redo().unwrap();
        assert_eq!(mgr.current_record().unwrap().args(), &[2]);
        assert!(!mgr.can_redo());

        let calls = log.borrow();
        assert_eq!(calls[4], (Direction::Forward, vec![1]));
        assert_eq!(calls[5], (Direction::Forward, vec![2]));
    }

    #[test]
    fn test_failed_undo_and_redo_change_nothing() {
        let (mut mgr, log) = manager_with_log();
        assert!(matches!(mgr.undo(), Err(HistoryError::NoPreviousAction)));
        assert!(matches!(mgr.redo(), Err(HistoryError::NoNextAction)));
        assert!(log.borrow().is_empty());
        assert!(mgr.is_empty());
    }

    #[test]
    fn test_unknown_action_is_not_recorded() {
        let (mut mgr, log) = manager_with_log();
        let err = mgr.execute("missing", vec![1]).unwrap_err();
        assert!(matches!(err, HistoryError::UnknownAction(ref n) if n == "missing"));
        assert!(mgr.is_empty());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_truncation_reclaims_detached_chain() {
        let (mut mgr, _) = manager_with_log();
        mgr.execute("op", vec![1]).unwrap();
        mgr.execute("op", vec![2]).unwrap();
        mgr.execute("op", vec![3]).unwrap();
        mgr.undo().unwrap();
        mgr.undo().unwrap();
        assert_eq!(mgr.len(), 3);

        mgr.execute("op", vec![4]).unwrap();
        assert_eq!(mgr.len(), 2);
        assert!(!mgr.can_redo());
        let args: Vec<i64> = mgr.applied().iter().map(|r| r.args()[0]).collect();
        assert_eq!(args, vec![1, 4]);
    }

    #[test]
    fn test_truncation_links_survivor_to_new_record() {
        let (mut mgr, log) = manager_with_log();
        mgr.execute("op", vec![1]).unwrap();
        let first = mgr.current_record().unwrap().id();
        mgr.execute("op", vec![2]).unwrap();
        mgr.undo().unwrap();

        mgr.execute("op", vec![3]).unwrap();
        let newest = mgr.current_record().unwrap();
        assert_eq!(newest.previous(), Some(first));
        assert_eq!(mgr.record(first).unwrap().next(), Some(newest.id()));
        assert_eq!(
            log.borrow().last(),
            Some(&(Direction::Forward, vec![3]))
        );
    }

    #[test]
    fn test_truncation_from_empty_cursor_reclaims_root() {
        let (mut mgr, _) = manager_with_log();
        mgr.execute("op", vec![1]).unwrap();
        mgr.undo().unwrap();
        mgr.execute("op", vec![2]).unwrap();

        assert_eq!(mgr.len(), 1);
        assert_eq!(mgr.current_record().unwrap().previous(), None);
    }

    #[test]
    fn test_retaining_config_keeps_detached_records() {
        let log: CallLog = Rc::new(RefCell::new(Vec::new()));
        let mut mgr = HistoryManager::with_config(HistoryConfig::retaining());
        mgr.register_action("op", logging_action(&log));

        mgr.execute("op", vec![1]).unwrap();
        let first = mgr.current_record().unwrap().id();
        mgr.execute("op", vec![2]).unwrap();
        let abandoned = mgr.current_record().unwrap().id();
        mgr.undo().unwrap();
        mgr.execute("op", vec![3]).unwrap();

        assert_eq!(mgr.len(), 3);
        assert!(mgr.record(abandoned).is_some());
        assert_ne!(mgr.record(first).unwrap().next(), Some(abandoned));
        assert_eq!(mgr.undo_depth(), 2);
        assert_eq!(mgr.redo_depth(), 0);
    }

    #[test]
    fn test_depths() {
        let (mut mgr, _) = manager_with_log();
        for i in 0..4 {
            mgr.execute("op", vec![i]).unwrap();
        }
        mgr.undo().unwrap();
        assert_eq!(mgr.undo_depth(), 3);
        assert_eq!(mgr.redo_depth(), 1);
    }

    #[test]
    fn test_handler_error_keeps_history() {
        let mut mgr: HistoryManager<i64, ()> = HistoryManager::new();
        mgr.register_action(
            "fail",
            ActionDefinition::new(|_| anyhow::bail!("boom"), |_| Ok(())),
        );

        let err = mgr.execute("fail", vec![1]).unwrap_err();
        assert!(matches!(
            err,
            HistoryError::Handler {
                direction: Direction::Forward,
                ..
            }
        ));
        assert!(mgr.can_undo());
        mgr.undo().unwrap();
    }

    #[test]
    fn test_missing_reverse_fails_after_cursor_moves() {
        let mut mgr: HistoryManager<i64, ()> = HistoryManager::new();
        mgr.register_action("reset", ActionDefinition::irreversible(|_| Ok(())));
        mgr.execute("reset", vec![]).unwrap();

        let err = mgr.undo().unwrap_err();
        assert!(matches!(
            err,
            HistoryError::MissingHandler {
                direction: Direction::Reverse,
                ..
            }
        ));
        assert!(!mgr.can_undo());
        assert!(mgr.can_redo());
        mgr.redo().unwrap();
    }

    #[test]
    fn test_deregistered_action_fails_on_replay() {
        let (mut mgr, log) = manager_with_log();
        mgr.execute("op", vec![1]).unwrap();
        mgr.deregister_action("op");
        assert!(!mgr.has_action("op"));

        let err = mgr.undo().unwrap_err();
        assert!(matches!(err, HistoryError::UnknownAction(_)));
        assert_eq!(log.borrow().len(), 1);
        assert!(mgr.can_redo());
    }

    #[test]
    fn test_deregister_absent_is_noop() {
        let (mut mgr, _) = manager_with_log();
        mgr.deregister_action("nope");
        assert_eq!(mgr.action_names(), vec!["op"]);
    }

    #[test]
    fn test_action_names_sorted() {
        let log: CallLog = Rc::new(RefCell::new(Vec::new()));
        let mgr = HistoryManager::with_actions([
            ("zeta", logging_action(&log)),
            ("alpha", logging_action(&log)),
            ("mid", logging_action(&log)),
        ]);
        assert_eq!(mgr.action_names(), vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_clear_keeps_actions() {
        let (mut mgr, _) = manager_with_log();
        mgr.execute("op", vec![1]).unwrap();
        mgr.undo().unwrap();
        mgr.clear();

        assert!(mgr.is_empty());
        assert!(!mgr.can_undo());
        assert!(!mgr.can_redo());
        assert!(mgr.has_action("op"));
    }

    #[test]
    fn test_debug_output() {
        let (mgr, _) = manager_with_log();
        let debug = format!("{mgr:?}");
        assert!(debug.contains("HistoryManager"));
        assert!(debug.contains("\"op\""));
    }
}
