//! Read-only state handed to the presentation layer.

use std::collections::BTreeSet;

use tasksync_core::id::TaskId;
use tasksync_core::{ErrorKind, FilterMode, Task, TaskCounts, visible};

use crate::edit::EditPhase;
use crate::store::StoreSnapshot;

/// A visible task together with its busy/editing flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRow {
    /// The committed task.
    pub task: Task,
    /// An update or delete for this task is unresolved.
    pub busy: bool,
    /// The task is in inline-edit mode.
    pub editing: bool,
}

/// Inline edit session as seen by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditView {
    /// Task under edit.
    pub task: TaskId,
    /// Current buffer contents.
    pub buffer: String,
    /// A commit is in flight; input should be locked.
    pub committing: bool,
}

/// Everything needed to render one frame of the task list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    /// Tasks passing the current filter, in collection order.
    pub rows: Vec<TaskRow>,
    /// Busy entry for the unresolved create request.
    pub placeholder: Option<Task>,
    /// Ids with an unresolved update or delete.
    pub pending: BTreeSet<TaskId>,
    /// Current filter.
    pub filter: FilterMode,
    /// Active edit session.
    pub edit: Option<EditView>,
    /// Active error classification.
    pub error: Option<ErrorKind>,
    /// Counters over the whole collection (not just the visible rows).
    pub counts: TaskCounts,
}

impl SessionView {
    /// Derive the view from a store snapshot.
    #[must_use]
    pub fn build(snapshot: StoreSnapshot, filter: FilterMode, error: Option<ErrorKind>) -> Self {
        let StoreSnapshot {
            tasks,
            pending,
            placeholder,
            edit,
        } = snapshot;
        let editing = edit.as_ref().map(crate::edit::EditSession::task);
        let rows = visible(&tasks, filter)
            .into_iter()
            .map(|task| TaskRow {
                busy: pending.contains(&task.id),
                editing: editing == Some(task.id),
                task: task.clone(),
            })
            .collect();
        Self {
            rows,
            placeholder,
            pending,
            filter,
            edit: edit.map(|session| EditView {
                task: session.task(),
                buffer: session.buffer().to_owned(),
                committing: session.phase() == EditPhase::Committing,
            }),
            error,
            counts: TaskCounts::of(&tasks),
        }
    }

    /// A create request is unresolved; the new-task input should be disabled.
    #[must_use]
    pub const fn submitting(&self) -> bool {
        self.placeholder.is_some()
    }

    /// Footer (counter, filters, clear button) is shown only for a non-empty collection.
    #[must_use]
    pub const fn show_footer(&self) -> bool {
        self.counts.total > 0
    }

    /// The toggle-all control is shown only for a non-empty collection.
    #[must_use]
    pub const fn show_toggle_all(&self) -> bool {
        self.counts.total > 0
    }

    /// Toggle-all control is in its "active" state.
    #[must_use]
    pub const fn all_completed(&self) -> bool {
        self.counts.all_completed()
    }

    /// Number of active tasks.
    #[must_use]
    pub const fn items_left(&self) -> usize {
        self.counts.active
    }

    /// Clear-completed is enabled only when something is completed.
    #[must_use]
    pub const fn can_clear_completed(&self) -> bool {
        self.counts.has_completed()
    }
}
