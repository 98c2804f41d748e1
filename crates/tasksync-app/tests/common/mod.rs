#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Result, anyhow};
use tasksync_app::{Controller, ErrorNotifier, RemoteClient, TaskStore};
use tasksync_core::id::{OwnerId, TaskId};
use tasksync_core::{NewTask, Task};
use tokio::sync::Notify;

/// A call observed by [`MockRemote`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List(OwnerId),
    Create(NewTask),
    Update(Task),
    Delete(TaskId),
}

/// In-memory stand-in for the todo service with failure injection and response gates.
#[derive(Clone)]
pub struct MockRemote {
    inner: Arc<Mutex<Inner>>,
}

impl Default for MockRemote {
    fn default() -> Self {
        Self::with_tasks(Vec::new())
    }
}

#[derive(Default)]
struct Inner {
    tasks: Vec<Task>,
    next_id: u64,
    calls: Vec<Call>,
    fail_list: bool,
    fail_create: bool,
    zero_id_on_create: bool,
    fail_update: HashSet<TaskId>,
    fail_delete: HashSet<TaskId>,
    create_gate: Option<Arc<Notify>>,
    update_gates: HashMap<TaskId, Arc<Notify>>,
    delete_gates: HashMap<TaskId, Arc<Notify>>,
}

impl MockRemote {
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let next_id = tasks.iter().map(|task| task.id.0).max().unwrap_or(0) + 1;
        Self {
            inner: Arc::new(Mutex::new(Inner {
                tasks,
                next_id,
                ..Inner::default()
            })),
        }
    }

    fn guard(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("lock mock remote")
    }

    pub fn calls(&self) -> Vec<Call> {
        self.guard().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.guard().calls.clear();
    }

    pub fn fail_list(&self) {
        self.guard().fail_list = true;
    }

    pub fn fail_create(&self) {
        self.guard().fail_create = true;
    }

    pub fn zero_id_on_create(&self) {
        self.guard().zero_id_on_create = true;
    }

    pub fn fail_update(&self, id: u64) {
        self.guard().fail_update.insert(TaskId(id));
    }

    pub fn fail_delete(&self, id: u64) {
        self.guard().fail_delete.insert(TaskId(id));
    }

    /// Creates wait for a permit on the returned gate before answering.
    pub fn hold_creates(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.guard().create_gate = Some(Arc::clone(&gate));
        gate
    }

    /// Updates of `id` wait for a permit on the returned gate before answering.
    pub fn hold_updates(&self, id: u64) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.guard()
            .update_gates
            .insert(TaskId(id), Arc::clone(&gate));
        gate
    }

    /// Deletes of `id` wait for a permit on the returned gate before answering.
    pub fn hold_deletes(&self, id: u64) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.guard()
            .delete_gates
            .insert(TaskId(id), Arc::clone(&gate));
        gate
    }
}

impl RemoteClient for MockRemote {
    type Error = anyhow::Error;

    async fn list(&self, owner: OwnerId) -> Result<Vec<Task>> {
        let mut inner = self.guard();
        inner.calls.push(Call::List(owner));
        if inner.fail_list {
            return Err(anyhow!("list failed"));
        }
        Ok(inner
            .tasks
            .iter()
            .filter(|task| task.owner == owner)
            .cloned()
            .collect())
    }

    async fn create(&self, task: &NewTask) -> Result<Task> {
        let gate = {
            let mut inner = self.guard();
            inner.calls.push(Call::Create(task.clone()));
            inner.create_gate.clone()
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let mut inner = self.guard();
        if inner.fail_create {
            return Err(anyhow!("create failed"));
        }
        let id = if inner.zero_id_on_create {
            TaskId::PLACEHOLDER
        } else {
            let id = TaskId(inner.next_id);
            inner.next_id += 1;
            id
        };
        let created = Task {
            id,
            title: task.title.clone(),
            completed: task.completed,
            owner: task.owner,
        };
        inner.tasks.push(created.clone());
        Ok(created)
    }

    async fn update(&self, task: &Task) -> Result<Task> {
        let gate = {
            let mut inner = self.guard();
            inner.calls.push(Call::Update(task.clone()));
            inner.update_gates.get(&task.id).cloned()
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let mut inner = self.guard();
        if inner.fail_update.contains(&task.id) {
            return Err(anyhow!("update of {} failed", task.id));
        }
        if let Some(stored) = inner.tasks.iter_mut().find(|t| t.id == task.id) {
            *stored = task.clone();
        }
        Ok(task.clone())
    }

    async fn delete(&self, id: TaskId) -> Result<()> {
        let gate = {
            let mut inner = self.guard();
            inner.calls.push(Call::Delete(id));
            inner.delete_gates.get(&id).cloned()
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let mut inner = self.guard();
        if inner.fail_delete.contains(&id) {
            return Err(anyhow!("delete of {id} failed"));
        }
        inner.tasks.retain(|task| task.id != id);
        Ok(())
    }
}

pub fn owner() -> OwnerId {
    OwnerId::new(2139).expect("non-zero owner")
}

pub fn task(id: u64, title: &str, completed: bool) -> Task {
    Task {
        id: TaskId(id),
        title: title.into(),
        completed,
        owner: owner(),
    }
}

pub fn store(remote: &MockRemote) -> TaskStore<MockRemote> {
    TaskStore::new(remote.clone(), owner(), ErrorNotifier::default())
}

pub fn controller(remote: &MockRemote) -> Controller<MockRemote> {
    Controller::with_store(store(remote))
}

/// Let every branch of a `tokio::join!` make progress.
pub async fn settle() {
    for _ in 0..4 {
        tokio::task::yield_now().await;
    }
}
