/// History records and the arena that owns them.
use std::collections::HashMap;
use std::fmt;

/// Stable identifier of a record within one manager.
///
/// Assigned from a monotonic counter and never reused, so a stale id can
/// only ever miss, not alias a newer record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId(u64);

impl RecordId {
    /// Raw sequence number.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One executed invocation of an action.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRecord<A> {
    id: RecordId,
    action: String,
    args: Vec<A>,
    previous: Option<RecordId>,
    next: Option<RecordId>,
}

impl<A> HistoryRecord<A> {
    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Name of the action this record dispatches to.
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Arguments captured when the action was executed.
    pub fn args(&self) -> &[A] {
        &self.args
    }

    /// The record this one was appended after, if any.
    pub fn previous(&self) -> Option<RecordId> {
        self.previous
    }

    /// The record appended directly after this one, if any.
    pub fn next(&self) -> Option<RecordId> {
        self.next
    }
}

/// Arena of history records linked by id.
///
/// Records only reference each other through [`RecordId`]s. Linking is done
/// exclusively by [`HistoryStore::append`], which keeps `previous`/`next`
/// consistent inverses.
#[derive(Debug)]
pub struct HistoryStore<A> {
    records: HashMap<RecordId, HistoryRecord<A>>,
    next_seq: u64,
}

impl<A> Default for HistoryStore<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> HistoryStore<A> {
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
            next_seq: 0,
        }
    }

    /// Appends a record after `previous` and returns it.
    ///
    /// When `previous` is set, its forward link is overwritten to point at the
    /// new record. Whatever it pointed at before becomes unreachable.
    pub fn append(
        &mut self,
        action: String,
        args: Vec<A>,
        previous: Option<RecordId>,
    ) -> &HistoryRecord<A> {
        let id = RecordId(self.next_seq);
        self.next_seq += 1;

        let previous = previous.filter(|p| self.records.contains_key(p));
        if let Some(prev) = previous.and_then(|p| self.records.get_mut(&p)) {
            prev.next = Some(id);
        }

        self.records.entry(id).or_insert(HistoryRecord {
            id,
            action,
            args,
            previous,
            next: None,
        })
    }

    pub fn get(&self, id: RecordId) -> Option<&HistoryRecord<A>> {
        self.records.get(&id)
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.records.contains_key(&id)
    }

    /// Removes `head` and every record reachable from it through forward links.
    ///
    /// Returns the number of records removed. Callers pass the head of a chain
    /// that is no longer linked from any live record.
    pub fn remove_chain(&mut self, head: RecordId) -> usize {
        let mut removed = 0;
        let mut cursor = Some(head);
        while let Some(id) = cursor {
            match self.records.remove(&id) {
                Some(record) => {
                    removed += 1;
                    cursor = record.next;
                }
                None => break,
            }
        }
        removed
    }

    /// Iterates from `head` along forward links.
    pub fn chain_from(&self, head: Option<RecordId>) -> impl Iterator<Item = &HistoryRecord<A>> {
        let mut cursor = head;
        std::iter::from_fn(move || {
            let record = self.records.get(&cursor?)?;
            cursor = record.next;
            Some(record)
        })
    }

    /// Iterates from `tail` along back links.
    pub fn ancestors_of(&self, tail: Option<RecordId>) -> impl Iterator<Item = &HistoryRecord<A>> {
        let mut cursor = tail;
        std::iter::from_fn(move || {
            let record = self.records.get(&cursor?)?;
            cursor = record.previous;
            Some(record)
        })
    }

    /// Number of records currently held, detached ones included.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drops every record. Ids keep increasing afterwards.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}
