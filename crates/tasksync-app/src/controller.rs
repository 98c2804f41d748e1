//! User-intent layer: maps actions onto store operations.
//!
//! The controller adds what the store does not know about: the visibility filter,
//! the inline edit flow, and focus requests for the presentation layer.

use std::sync::Mutex;
use std::time::Duration;

use tasksync_core::id::{OwnerId, TaskId};
use tasksync_core::{ErrorKind, FilterMode, Task};
use tracing::debug;

use crate::edit::{CommitPlan, EditError};
use crate::lock;
use crate::notifier::ErrorNotifier;
use crate::remote::RemoteClient;
use crate::store::{BatchOutcome, SyncError, TaskStore};
use crate::view::SessionView;

/// Input the presentation layer should focus next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    /// The new-task input.
    NewTask,
    /// The inline edit field of a task.
    EditField(TaskId),
}

/// Result of an edit commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// No session for that task was editing (already committing, cancelled or ended).
    Ignored,
    /// The trimmed title matched the original; no remote call was made.
    Unchanged,
    /// The new title was stored.
    Saved(Task),
    /// The title was blank and the task was deleted.
    Deleted,
}

/// Interaction controller for one task list session.
pub struct Controller<C> {
    store: TaskStore<C>,
    filter: Mutex<FilterMode>,
    focus: Mutex<Option<Focus>>,
}

impl<C> Controller<C> {
    /// Create a controller whose notifications expire after `notice_timeout`.
    pub fn new(client: C, owner: OwnerId, notice_timeout: Duration) -> Self {
        Self::with_store(TaskStore::new(client, owner, ErrorNotifier::new(notice_timeout)))
    }

    /// Wrap an existing store.
    pub fn with_store(store: TaskStore<C>) -> Self {
        Self {
            store,
            filter: Mutex::new(FilterMode::default()),
            focus: Mutex::new(None),
        }
    }

    /// Underlying store.
    pub const fn store(&self) -> &TaskStore<C> {
        &self.store
    }

    /// Current visibility filter.
    pub fn filter(&self) -> FilterMode {
        *lock(&self.filter)
    }

    /// Change the visibility filter. Purely local.
    pub fn set_filter(&self, mode: FilterMode) {
        *lock(&self.filter) = mode;
        debug!(filter = %mode, "Filter changed");
    }

    /// Active error classification.
    pub fn current_error(&self) -> Option<ErrorKind> {
        self.store.notifier().current()
    }

    /// Close the error notification immediately.
    pub fn dismiss_error(&self) {
        self.store.notifier().dismiss();
    }

    /// Take the pending focus request, if any.
    pub fn take_focus(&self) -> Option<Focus> {
        lock(&self.focus).take()
    }

    fn request_focus(&self, focus: Focus) {
        *lock(&self.focus) = Some(focus);
    }

    /// Put `id` into inline-edit mode.
    ///
    /// # Errors
    /// Refused while another task is being edited, or when `id` is unknown.
    pub fn edit_start(&self, id: TaskId) -> Result<(), EditError> {
        self.store.begin_edit(id)
    }

    /// Replace the edit buffer; returns false when `id` is not editable right now.
    pub fn edit_input(&self, id: TaskId, text: &str) -> bool {
        self.store.set_edit_buffer(id, text)
    }

    /// Leave edit mode without saving. Has no effect while a commit is in flight.
    pub fn edit_cancel(&self, id: TaskId) -> bool {
        self.store.cancel_edit(id)
    }

    /// Everything the presentation layer needs for one frame.
    pub fn view(&self) -> SessionView {
        SessionView::build(self.store.snapshot(), self.filter(), self.current_error())
    }
}

impl<C: RemoteClient> Controller<C> {
    /// Load the owner's tasks.
    ///
    /// # Errors
    /// Propagates the store's load failure.
    pub async fn init(&self) -> Result<usize, SyncError> {
        self.store.load().await
    }

    /// Submit a new task.
    ///
    /// # Errors
    /// Propagates the store's create failure; remote failures also request focus on
    /// the new-task input.
    pub async fn add(&self, title: &str) -> Result<Task, SyncError> {
        let result = self.store.create(title).await;
        if matches!(&result, Err(err) if err.kind() == Some(ErrorKind::Adding)) {
            self.request_focus(Focus::NewTask);
        }
        result
    }

    /// Flip the completion flag of `id`, built from the latest collection entry.
    ///
    /// # Errors
    /// Returns [`SyncError::MissingTask`] for unknown ids, else propagates the update failure.
    pub async fn toggle_one(&self, id: TaskId) -> Result<Task, SyncError> {
        let task = self.store.task(id).ok_or(SyncError::MissingTask(id))?;
        let toggled = task.with_completed(!task.completed);
        self.store.update(toggled).await
    }

    /// Commit the edit session for `id` with `title` as the final buffer.
    ///
    /// Only the first commit of a session does any work; a commit arriving while the
    /// first is unresolved returns [`CommitOutcome::Ignored`].
    ///
    /// # Errors
    /// On remote failure the session returns to editing and focus goes back to the
    /// edit field.
    pub async fn edit_commit(&self, id: TaskId, title: &str) -> Result<CommitOutcome, SyncError> {
        let Some((plan, claim)) = self.store.claim_commit(id, title) else {
            return Ok(CommitOutcome::Ignored);
        };
        let result = match plan {
            CommitPlan::Unchanged => return Ok(CommitOutcome::Unchanged),
            CommitPlan::Remove => self.store.delete(id).await.map(|()| CommitOutcome::Deleted),
            CommitPlan::Rename(task) => self.store.update(task).await.map(CommitOutcome::Saved),
        };
        claim.settle(result.is_ok());
        if result.is_err() {
            self.request_focus(Focus::EditField(id));
        }
        result
    }

    /// Delete `id`.
    ///
    /// # Errors
    /// Propagates the store's delete failure; remote failures also request focus on
    /// the new-task input.
    pub async fn delete(&self, id: TaskId) -> Result<(), SyncError> {
        let result = self.store.delete(id).await;
        if matches!(&result, Err(err) if err.kind() == Some(ErrorKind::Deleting)) {
            self.request_focus(Focus::NewTask);
        }
        result
    }

    /// Complete every active task, or reopen all when none is active.
    pub async fn toggle_all(&self) -> BatchOutcome<Task> {
        self.store.toggle_all().await
    }

    /// Delete every completed task.
    pub async fn clear_completed(&self) -> BatchOutcome<()> {
        self.store.clear_completed().await
    }
}
