//! Async seam between the task store and the remote service.

use anyhow::Error;
use std::sync::Arc;
use tasksync_core::id::{OwnerId, TaskId};
use tasksync_core::{NewTask, Task};
use tasksync_http::{HttpClient, RemoteError};

/// Remote persistence calls required by [`crate::store::TaskStore`].
///
/// Every call either succeeds with the canonical server representation or fails;
/// there is no partial-success shape.
#[allow(async_fn_in_trait)]
pub trait RemoteClient {
    /// Error type bubbled up from the transport.
    type Error: Into<Error>;

    /// Fetch the whole collection for `owner`.
    ///
    /// # Errors
    /// Returns a client-specific error when the request fails.
    async fn list(&self, owner: OwnerId) -> Result<Vec<Task>, Self::Error>;

    /// Create a task and return it with its server-assigned id.
    ///
    /// # Errors
    /// Returns a client-specific error when the request fails.
    async fn create(&self, task: &NewTask) -> Result<Task, Self::Error>;

    /// Replace a task and return the stored value.
    ///
    /// # Errors
    /// Returns a client-specific error when the request fails.
    async fn update(&self, task: &Task) -> Result<Task, Self::Error>;

    /// Delete a task.
    ///
    /// # Errors
    /// Returns a client-specific error when the request fails.
    async fn delete(&self, id: TaskId) -> Result<(), Self::Error>;
}

impl RemoteClient for HttpClient {
    type Error = RemoteError;

    async fn list(&self, owner: OwnerId) -> Result<Vec<Task>, Self::Error> {
        self.list_tasks(owner).await
    }

    async fn create(&self, task: &NewTask) -> Result<Task, Self::Error> {
        self.create_task(task).await
    }

    async fn update(&self, task: &Task) -> Result<Task, Self::Error> {
        self.update_task(task).await
    }

    async fn delete(&self, id: TaskId) -> Result<(), Self::Error> {
        self.delete_task(id).await
    }
}

impl<C> RemoteClient for &C
where
    C: RemoteClient + ?Sized,
{
    type Error = C::Error;

    async fn list(&self, owner: OwnerId) -> Result<Vec<Task>, Self::Error> {
        (*self).list(owner).await
    }

    async fn create(&self, task: &NewTask) -> Result<Task, Self::Error> {
        (*self).create(task).await
    }

    async fn update(&self, task: &Task) -> Result<Task, Self::Error> {
        (*self).update(task).await
    }

    async fn delete(&self, id: TaskId) -> Result<(), Self::Error> {
        (*self).delete(id).await
    }
}

impl<C> RemoteClient for Arc<C>
where
    C: RemoteClient,
{
    type Error = C::Error;

    async fn list(&self, owner: OwnerId) -> Result<Vec<Task>, Self::Error> {
        (**self).list(owner).await
    }

    async fn create(&self, task: &NewTask) -> Result<Task, Self::Error> {
        (**self).create(task).await
    }

    async fn update(&self, task: &Task) -> Result<Task, Self::Error> {
        (**self).update(task).await
    }

    async fn delete(&self, id: TaskId) -> Result<(), Self::Error> {
        (**self).delete(id).await
    }
}
