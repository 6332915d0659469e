//! # Task registry - per-task display records.
//!
//! Every task loaded into an [`Orchestrator`](crate::Orchestrator) gets a
//! [`TaskRecord`] (id, title, state) held in a slot. The slot is handed to that
//! task's bridge and reporter, which are the only writers; everyone else reads
//! snapshots through [`Registry`].
//!
//! ## State machine
//! ```text
//! NotStarted ──► Running ──┬──► Succeeded
//!                          └──► Failed
//! NotStarted ─────────────────► Failed     (cancelled before it could start)
//! ```
//!
//! ## Rules
//! - Records are kept in registration order.
//! - Ids are not checked for uniqueness; duplicates get separate records.
//! - Terminal states are final; later writes are ignored.

use std::sync::{Arc, PoisonError, RwLock};

/// Lifecycle state of one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Registered, not started yet.
    NotStarted,
    /// Handle is executing.
    Running,
    /// Handle returned a value.
    Succeeded,
    /// Handle returned an error, timed out, panicked or was cancelled.
    Failed,
}

impl TaskState {
    /// True for `Succeeded` and `Failed`.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Succeeded | TaskState::Failed)
    }

    /// Returns a short stable label for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            TaskState::NotStarted => "not_started",
            TaskState::Running => "running",
            TaskState::Succeeded => "succeeded",
            TaskState::Failed => "failed",
        }
    }
}

/// Snapshot of one task as the presentation layer sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    /// Task id as registered.
    pub id: Arc<str>,
    /// Current display title.
    pub title: String,
    /// Current lifecycle state.
    pub state: TaskState,
}

/// Slot owning one task's record. Shared by the task's bridge and reporter.
#[derive(Debug)]
pub(crate) struct Slot {
    id: Arc<str>,
    record: RwLock<TaskRecord>,
}

impl Slot {
    pub(crate) fn new(id: Arc<str>, title: String) -> Arc<Self> {
        Arc::new(Self {
            record: RwLock::new(TaskRecord {
                id: id.clone(),
                title,
                state: TaskState::NotStarted,
            }),
            id,
        })
    }

    pub(crate) fn id(&self) -> &Arc<str> {
        &self.id
    }

    pub(crate) fn snapshot(&self) -> TaskRecord {
        self.record
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn state(&self) -> TaskState {
        self.record
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .state
    }

    pub(crate) fn title(&self) -> String {
        self.record
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .title
            .clone()
    }

    /// Replaces the title; returns `false` once the task is terminal.
    pub(crate) fn set_title(&self, title: &str) -> bool {
        let mut rec = self.record.write().unwrap_or_else(PoisonError::into_inner);
        if rec.state.is_terminal() {
            return false;
        }
        rec.title = title.to_owned();
        true
    }

    /// Moves to `state`; returns `false` if the record was already terminal.
    pub(crate) fn transition(&self, state: TaskState) -> bool {
        let mut rec = self.record.write().unwrap_or_else(PoisonError::into_inner);
        if rec.state.is_terminal() {
            return false;
        }
        rec.state = state;
        true
    }
}

/// Registration-ordered table of task records.
///
/// Obtain it with [`Orchestrator::registry`](crate::Orchestrator::registry) before
/// calling `start`; it keeps reflecting live state while tasks run.
#[derive(Debug, Default)]
pub struct Registry {
    slots: RwLock<Vec<Arc<Slot>>>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a record in `NotStarted` state and returns its slot.
    pub(crate) fn register(&self, id: Arc<str>, title: String) -> Arc<Slot> {
        let slot = Slot::new(id, title);
        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::clone(&slot));
        slot
    }

    /// Returns every record in registration order.
    pub fn snapshot(&self) -> Vec<TaskRecord> {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|s| s.snapshot())
            .collect()
    }

    /// Returns the first record registered under `id`.
    pub fn get(&self, id: &str) -> Option<TaskRecord> {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|s| s.id().as_ref() == id)
            .map(|s| s.snapshot())
    }

    /// Number of records in the given state.
    pub fn count(&self, state: TaskState) -> usize {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|s| s.state() == state)
            .count()
    }

    /// True once every registered task is terminal.
    pub fn is_settled(&self) -> bool {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .all(|s| s.state().is_terminal())
    }

    /// Number of registered tasks.
    pub fn len(&self) -> usize {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_keep_registration_order() {
        let reg = Registry::new();
        reg.register("b".into(), "Bravo".into());
        reg.register("a".into(), "Alpha".into());

        let ids: Vec<String> = reg.snapshot().iter().map(|r| r.id.to_string()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(reg.count(TaskState::NotStarted), 2);
        assert!(!reg.is_settled());
    }

    #[test]
    fn terminal_state_is_final() {
        let reg = Registry::new();
        let slot = reg.register("a".into(), "Alpha".into());

        assert!(slot.transition(TaskState::Running));
        assert!(slot.set_title("waiting for response"));
        assert!(slot.transition(TaskState::Failed));
        assert!(!slot.transition(TaskState::Succeeded));
        assert!(!slot.set_title("late"));

        let rec = reg.get("a").unwrap();
        assert_eq!(rec.state, TaskState::Failed);
        assert_eq!(rec.title, "waiting for response");
        assert!(reg.is_settled());
    }
}
