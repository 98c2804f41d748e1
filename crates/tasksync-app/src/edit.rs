//! Inline title editing state machine.
//!
//! A session is `Editing` until a commit is claimed, then `Committing` until the
//! remote call settles. Only the first claim of a session does any work; repeated
//! claims (submit followed by focus loss) find the session no longer `Editing`.

use tasksync_core::Task;
use tasksync_core::id::TaskId;

/// Phase of the active edit session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditPhase {
    /// The buffer is being edited.
    Editing,
    /// A commit has been claimed and its remote call is unresolved.
    Committing,
}

/// The single task currently in inline-edit mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    task: TaskId,
    original: String,
    buffer: String,
    phase: EditPhase,
}

/// Work decided when a commit is claimed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitPlan {
    /// Trimmed buffer equals the original title; the session already ended.
    Unchanged,
    /// Buffer is blank: delete the task.
    Remove,
    /// Save the task with the new (trimmed) title.
    Rename(Task),
}

/// Reasons an edit transition is refused.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    /// Another task is being edited.
    #[error("task {0} is already being edited")]
    SessionActive(TaskId),
    /// The target is not in the collection.
    #[error("task {0} not found")]
    MissingTask(TaskId),
}

impl EditSession {
    /// Start editing `task`, seeding the buffer with its title.
    #[must_use]
    pub fn start(task: &Task) -> Self {
        Self {
            task: task.id,
            original: task.title.clone(),
            buffer: task.title.clone(),
            phase: EditPhase::Editing,
        }
    }

    /// Task under edit.
    #[must_use]
    pub const fn task(&self) -> TaskId {
        self.task
    }

    /// Current buffer contents.
    #[must_use]
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> EditPhase {
        self.phase
    }

    /// Replace the buffer; ignored while committing.
    pub fn set_buffer(&mut self, text: impl Into<String>) -> bool {
        if self.phase != EditPhase::Editing {
            return false;
        }
        self.buffer = text.into();
        true
    }

    /// Move `Editing → Committing` and decide what the commit must do.
    ///
    /// `current` is the latest collection entry for the task. Returns `None` when the
    /// session is already committing.
    pub fn claim(&mut self, current: &Task) -> Option<CommitPlan> {
        if self.phase != EditPhase::Editing {
            return None;
        }
        let title = self.buffer.trim();
        if title == self.original {
            return Some(CommitPlan::Unchanged);
        }
        self.phase = EditPhase::Committing;
        if title.is_empty() {
            Some(CommitPlan::Remove)
        } else {
            Some(CommitPlan::Rename(current.with_title(title)))
        }
    }

    /// A failed commit returns the session to `Editing` so the user can retry.
    pub fn reopen(&mut self) {
        self.phase = EditPhase::Editing;
    }
}
