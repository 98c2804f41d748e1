//! Local task collection kept in sync with the remote service.
//!
//! All state lives behind one lock that is never held across an `.await`. Each
//! remote outcome is applied in a single critical section against the collection as
//! it is at that moment, so overlapping operations never write back stale snapshots.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use anyhow::anyhow;
use futures::future::join_all;
use tasksync_core::id::{OwnerId, TaskId};
use tasksync_core::{ErrorKind, NewTask, Task};
use tracing::{debug, info, warn};

use crate::edit::{CommitPlan, EditError, EditPhase, EditSession};
use crate::lock;
use crate::notifier::ErrorNotifier;
use crate::remote::RemoteClient;

/// Errors surfaced by [`TaskStore`] operations.
#[derive(thiserror::Error, Debug)]
pub enum SyncError {
    /// Submitted title was blank after trimming.
    #[error("title must not be empty")]
    EmptyTitle,
    /// A create request is already unresolved.
    #[error("a task is already being created")]
    CreateInFlight,
    /// The task is not part of the collection.
    #[error("task {0} not found")]
    MissingTask(TaskId),
    /// The placeholder id cannot be sent to the service.
    #[error("the placeholder task cannot be synchronized")]
    Placeholder,
    /// The remote call failed.
    #[error("{kind}: {source}")]
    Remote {
        /// Classification raised for this failure.
        kind: ErrorKind,
        /// Underlying client error.
        #[source]
        source: anyhow::Error,
    },
}

impl SyncError {
    /// Classification surfaced to the user, if any.
    #[must_use]
    pub const fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::EmptyTitle => Some(ErrorKind::EmptyTitle),
            Self::Remote { kind, .. } => Some(*kind),
            Self::CreateInFlight | Self::MissingTask(_) | Self::Placeholder => None,
        }
    }
}

/// Per-task results of a bulk operation, in the order the operations were issued.
#[derive(Debug)]
pub struct BatchOutcome<T> {
    entries: Vec<(TaskId, Result<T, SyncError>)>,
}

impl<T> BatchOutcome<T> {
    fn new(entries: Vec<(TaskId, Result<T, SyncError>)>) -> Self {
        Self { entries }
    }

    /// Number of operations issued.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing had to be done.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when every operation succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.entries.iter().all(|(_, result)| result.is_ok())
    }

    /// Ids whose operation succeeded.
    pub fn succeeded(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.entries
            .iter()
            .filter(|(_, result)| result.is_ok())
            .map(|(id, _)| *id)
    }

    /// Ids whose operation failed, with the error.
    pub fn failed(&self) -> impl Iterator<Item = (TaskId, &SyncError)> + '_ {
        self.entries
            .iter()
            .filter_map(|(id, result)| result.as_ref().err().map(|err| (*id, err)))
    }
}

/// Consistent read-only copy of the store state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreSnapshot {
    /// Committed tasks in display order.
    pub tasks: Vec<Task>,
    /// Ids with an unresolved update or delete.
    pub pending: BTreeSet<TaskId>,
    /// Placeholder shown while a create request is unresolved.
    pub placeholder: Option<Task>,
    /// Active inline edit session.
    pub edit: Option<EditSession>,
}

#[derive(Debug, Default)]
struct StoreState {
    tasks: Vec<Task>,
    // Reference counted so overlapping mutations of one id keep it busy until the last settles.
    pending: BTreeMap<TaskId, usize>,
    placeholder: Option<Task>,
    edit: Option<EditSession>,
}

impl StoreState {
    fn contains(&self, id: TaskId) -> bool {
        self.tasks.iter().any(|task| task.id == id)
    }

    fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    fn mark_pending(&mut self, id: TaskId) {
        *self.pending.entry(id).or_default() += 1;
    }

    fn release_pending(&mut self, id: TaskId) {
        if let Some(count) = self.pending.get_mut(&id) {
            *count -= 1;
            if *count == 0 {
                self.pending.remove(&id);
            }
        }
    }

    fn replace_all(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
        if let Some(session) = &self.edit
            && !self.contains(session.task())
        {
            self.edit = None;
        }
    }

    fn append(&mut self, task: Task) {
        if let Some(existing) = self.tasks.iter_mut().find(|t| t.id == task.id) {
            warn!(task = %task.id, "Service returned an id that is already loaded, replacing entry");
            *existing = task;
        } else {
            self.tasks.push(task);
        }
    }

    fn replace(&mut self, task: Task) -> bool {
        match self.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(existing) => {
                *existing = task;
                true
            }
            None => false,
        }
    }

    fn settle_edit(&mut self, id: TaskId, succeeded: bool) {
        let Some(session) = self.edit.as_mut().filter(|session| session.task() == id) else {
            return;
        };
        if succeeded {
            self.edit = None;
        } else {
            session.reopen();
        }
    }

    fn remove(&mut self, id: TaskId) {
        self.tasks.retain(|task| task.id != id);
        if self.edit.as_ref().is_some_and(|session| session.task() == id) {
            self.edit = None;
        }
    }

    fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            tasks: self.tasks.clone(),
            pending: self.pending.keys().copied().collect(),
            placeholder: self.placeholder.clone(),
            edit: self.edit.clone(),
        }
    }
}

/// Pending Set membership for one operation; released on drop.
struct PendingGuard<'a> {
    state: &'a Mutex<StoreState>,
    id: TaskId,
    armed: bool,
}

impl<'a> PendingGuard<'a> {
    fn acquire(state: &'a Mutex<StoreState>, id: TaskId) -> Result<Self, SyncError> {
        if id.is_placeholder() {
            return Err(SyncError::Placeholder);
        }
        let mut guard = lock(state);
        if !guard.contains(id) {
            return Err(SyncError::MissingTask(id));
        }
        guard.mark_pending(id);
        drop(guard);
        debug!(task = %id, "Marked pending");
        Ok(Self {
            state,
            id,
            armed: true,
        })
    }

    /// Apply `f` and release membership in the same critical section.
    fn finish<R>(mut self, f: impl FnOnce(&mut StoreState) -> R) -> R {
        let mut guard = lock(self.state);
        let out = f(&mut guard);
        guard.release_pending(self.id);
        self.armed = false;
        out
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            lock(self.state).release_pending(self.id);
        }
    }
}

/// Placeholder ownership for one create call; cleared on drop.
struct PlaceholderGuard<'a> {
    state: &'a Mutex<StoreState>,
    armed: bool,
}

impl<'a> PlaceholderGuard<'a> {
    fn install(state: &'a Mutex<StoreState>, placeholder: Task) -> Result<Self, SyncError> {
        let mut guard = lock(state);
        if guard.placeholder.is_some() {
            return Err(SyncError::CreateInFlight);
        }
        guard.placeholder = Some(placeholder);
        drop(guard);
        Ok(Self { state, armed: true })
    }

    fn finish(mut self, f: impl FnOnce(&mut StoreState)) {
        let mut guard = lock(self.state);
        f(&mut guard);
        guard.placeholder = None;
        self.armed = false;
    }
}

impl Drop for PlaceholderGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            lock(self.state).placeholder = None;
        }
    }
}

/// A claimed edit commit; the session goes back to `Editing` unless settled.
pub(crate) struct CommitClaim<'a> {
    state: &'a Mutex<StoreState>,
    id: TaskId,
    armed: bool,
}

impl CommitClaim<'_> {
    /// End the session on success, reopen it on failure.
    pub(crate) fn settle(mut self, succeeded: bool) {
        lock(self.state).settle_edit(self.id, succeeded);
        self.armed = false;
    }
}

impl Drop for CommitClaim<'_> {
    fn drop(&mut self) {
        if self.armed {
            lock(self.state).settle_edit(self.id, false);
        }
    }
}

/// Authoritative local collection with optimistic-update bookkeeping.
pub struct TaskStore<C> {
    client: C,
    owner: OwnerId,
    state: Mutex<StoreState>,
    notifier: ErrorNotifier,
}

impl<C> TaskStore<C> {
    /// Create an empty store for `owner`.
    pub fn new(client: C, owner: OwnerId, notifier: ErrorNotifier) -> Self {
        Self {
            client,
            owner,
            state: Mutex::new(StoreState::default()),
            notifier,
        }
    }

    /// Owner every task is scoped to.
    pub const fn owner(&self) -> OwnerId {
        self.owner
    }

    /// Notifier receiving failure classifications.
    pub const fn notifier(&self) -> &ErrorNotifier {
        &self.notifier
    }

    /// Consistent copy of every piece of state.
    pub fn snapshot(&self) -> StoreSnapshot {
        lock(&self.state).snapshot()
    }

    /// Committed tasks in display order.
    pub fn tasks(&self) -> Vec<Task> {
        lock(&self.state).tasks.clone()
    }

    /// Look up a committed task.
    pub fn task(&self, id: TaskId) -> Option<Task> {
        lock(&self.state).get(id).cloned()
    }

    /// Ids with an unresolved update or delete.
    pub fn pending(&self) -> BTreeSet<TaskId> {
        lock(&self.state).pending.keys().copied().collect()
    }

    /// Returns true while `id` has an unresolved update or delete.
    pub fn is_pending(&self, id: TaskId) -> bool {
        lock(&self.state).pending.contains_key(&id)
    }

    /// Placeholder for the unresolved create request, if any.
    pub fn placeholder(&self) -> Option<Task> {
        lock(&self.state).placeholder.clone()
    }

    /// Task currently in inline-edit mode.
    pub fn editing_target(&self) -> Option<TaskId> {
        lock(&self.state).edit.as_ref().map(EditSession::task)
    }

    pub(crate) fn begin_edit(&self, id: TaskId) -> Result<(), EditError> {
        let mut state = lock(&self.state);
        if let Some(session) = &state.edit {
            return if session.task() == id {
                Ok(())
            } else {
                Err(EditError::SessionActive(session.task()))
            };
        }
        let session = state
            .get(id)
            .map(EditSession::start)
            .ok_or(EditError::MissingTask(id))?;
        state.edit = Some(session);
        Ok(())
    }

    pub(crate) fn set_edit_buffer(&self, id: TaskId, text: &str) -> bool {
        let mut state = lock(&self.state);
        match state.edit.as_mut() {
            Some(session) if session.task() == id => session.set_buffer(text),
            _ => false,
        }
    }

    /// Claim the commit of the session for `id`; `None` when there is nothing to do.
    ///
    /// An `Unchanged` plan has already ended the session. Any other plan comes with a
    /// claim that must be settled once the remote call resolves.
    pub(crate) fn claim_commit(
        &self,
        id: TaskId,
        text: &str,
    ) -> Option<(CommitPlan, CommitClaim<'_>)> {
        let mut guard = lock(&self.state);
        let state = &mut *guard;
        let session = state.edit.as_mut().filter(|session| session.task() == id)?;
        let Some(current) = state.tasks.iter().find(|task| task.id == id) else {
            state.edit = None;
            return None;
        };
        session.set_buffer(text);
        let plan = session.claim(current)?;
        let armed = plan != CommitPlan::Unchanged;
        if !armed {
            state.edit = None;
        }
        Some((
            plan,
            CommitClaim {
                state: &self.state,
                id,
                armed,
            },
        ))
    }

    pub(crate) fn cancel_edit(&self, id: TaskId) -> bool {
        let mut state = lock(&self.state);
        let cancellable = state.edit.as_ref().is_some_and(|session| {
            session.task() == id && session.phase() == EditPhase::Editing
        });
        if cancellable {
            state.edit = None;
        }
        cancellable
    }

    fn remote_failure(&self, kind: ErrorKind, source: anyhow::Error) -> SyncError {
        warn!(?kind, error = %source, "Remote call failed");
        self.notifier.raise(kind);
        SyncError::Remote { kind, source }
    }
}

impl<C: RemoteClient> TaskStore<C> {
    /// Replace the collection with the owner's tasks from the service.
    ///
    /// # Errors
    /// Raises [`ErrorKind::Loading`] and leaves the collection untouched on failure.
    pub async fn load(&self) -> Result<usize, SyncError> {
        match self.client.list(self.owner).await {
            Ok(tasks) => {
                let (tasks, dropped): (Vec<_>, Vec<_>) =
                    tasks.into_iter().partition(|task| !task.id.is_placeholder());
                if !dropped.is_empty() {
                    warn!(count = dropped.len(), "Ignoring tasks without an id");
                }
                let count = tasks.len();
                lock(&self.state).replace_all(tasks);
                info!(count, owner = %self.owner, "Loaded tasks");
                Ok(count)
            }
            Err(err) => Err(self.remote_failure(ErrorKind::Loading, err.into())),
        }
    }

    /// Create a task titled `title` (trimmed) and append it once the service confirms.
    ///
    /// # Errors
    /// Returns [`SyncError::EmptyTitle`] without contacting the service for a blank
    /// title, [`SyncError::CreateInFlight`] while another create is unresolved, and a
    /// remote error (raising [`ErrorKind::Adding`]) when the service call fails.
    pub async fn create(&self, title: &str) -> Result<Task, SyncError> {
        let title = title.trim();
        if title.is_empty() {
            self.notifier.raise(ErrorKind::EmptyTitle);
            return Err(SyncError::EmptyTitle);
        }
        let placeholder = PlaceholderGuard::install(&self.state, Task::placeholder(title, self.owner))?;

        let request = NewTask::active(title, self.owner);
        let created = self
            .client
            .create(&request)
            .await
            .map_err(Into::into)
            .and_then(|task| {
                if task.id.is_placeholder() {
                    Err(anyhow!("service returned a task without an id"))
                } else {
                    Ok(task)
                }
            });

        match created {
            Ok(task) => {
                placeholder.finish(|state| state.append(task.clone()));
                info!(task = %task.id, "Created task");
                Ok(task)
            }
            Err(err) => {
                drop(placeholder);
                Err(self.remote_failure(ErrorKind::Adding, err))
            }
        }
    }

    /// Replace a task with `task` and store the value the service returns.
    ///
    /// # Errors
    /// Returns [`SyncError::MissingTask`] for unknown ids, and a remote error (raising
    /// [`ErrorKind::Updating`]) when the call fails; the collection is unchanged then.
    pub async fn update(&self, task: Task) -> Result<Task, SyncError> {
        let id = task.id;
        let pending = PendingGuard::acquire(&self.state, id)?;

        let stored = self
            .client
            .update(&task)
            .await
            .map_err(Into::into)
            .and_then(|stored| {
                if stored.id == id {
                    Ok(stored)
                } else {
                    Err(anyhow!("service answered update of task {id} with task {}", stored.id))
                }
            });

        match stored {
            Ok(stored) => {
                let applied = pending.finish(|state| state.replace(stored.clone()));
                if applied {
                    info!(task = %id, completed = stored.completed, "Updated task");
                } else {
                    debug!(task = %id, "Task was removed while updating, dropping response");
                }
                Ok(stored)
            }
            Err(err) => {
                drop(pending);
                Err(self.remote_failure(ErrorKind::Updating, err))
            }
        }
    }

    /// Delete a task, removing it locally once the service confirms.
    ///
    /// # Errors
    /// Returns [`SyncError::MissingTask`] for unknown ids, and a remote error (raising
    /// [`ErrorKind::Deleting`]) when the call fails; the task stays in the collection then.
    pub async fn delete(&self, id: TaskId) -> Result<(), SyncError> {
        let pending = PendingGuard::acquire(&self.state, id)?;

        match self.client.delete(id).await {
            Ok(()) => {
                pending.finish(|state| state.remove(id));
                info!(task = %id, "Deleted task");
                Ok(())
            }
            Err(err) => {
                drop(pending);
                Err(self.remote_failure(ErrorKind::Deleting, err.into()))
            }
        }
    }

    /// Complete every active task, or reopen every task when none is active.
    ///
    /// Updates run concurrently and independently; one failure does not affect the others.
    pub async fn toggle_all(&self) -> BatchOutcome<Task> {
        let targets: Vec<Task> = {
            let state = lock(&self.state);
            let any_active = state.tasks.iter().any(Task::is_active);
            state
                .tasks
                .iter()
                .filter(|task| !any_active || task.is_active())
                .map(|task| task.with_completed(any_active))
                .collect()
        };
        debug!(count = targets.len(), "Toggling tasks");

        let results = join_all(targets.into_iter().map(|task| async move {
            let id = task.id;
            (id, self.update(task).await)
        }))
        .await;
        BatchOutcome::new(results)
    }

    /// Delete every completed task, concurrently and independently.
    pub async fn clear_completed(&self) -> BatchOutcome<()> {
        let targets: Vec<TaskId> = lock(&self.state)
            .tasks
            .iter()
            .filter(|task| task.completed)
            .map(|task| task.id)
            .collect();
        debug!(count = targets.len(), "Clearing completed tasks");

        let results = join_all(
            targets
                .into_iter()
                .map(|id| async move { (id, self.delete(id).await) }),
        )
        .await;
        BatchOutcome::new(results)
    }
}
