/// Configuration for the history manager.
use serde::{Deserialize, Serialize};

/// Tunables for a [`HistoryManager`](crate::HistoryManager).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Drop detached records from the arena as soon as a new action
    /// truncates the redoable future. When false they linger until `clear()`.
    pub reclaim_detached: bool,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            reclaim_detached: true,
        }
    }
}

impl HistoryConfig {
    /// Config that never reclaims detached records.
    ///
    /// Useful when inspecting abandoned branches after the fact.
    pub fn retaining() -> Self {
        Self {
            reclaim_detached: false,
        }
    }
}
