//! HTTP client for the remote todo service.

mod error;

pub use error::RemoteError;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Response, Url};
use std::time::Duration;
use tasksync_core::id::{OwnerId, TaskId};
use tasksync_core::{NewTask, Task};
use tracing::{debug, info, warn};

const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";
const TODOS: &str = "todos";

/// Client for the REST endpoints under `{base_url}/todos`.
#[derive(Debug, Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpClient {
    /// Build a client for `base_url` whose requests give up after `timeout`.
    ///
    /// # Errors
    /// Returns an error if the URL cannot be parsed or the TLS backend fails to initialize.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RemoteError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        Url::parse(trimmed).map_err(|err| RemoteError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: err.to_string(),
        })?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: trimmed.to_owned(),
        })
    }

    /// Base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self) -> String {
        format!("{}/{TODOS}", self.base_url)
    }

    fn item_url(&self, id: TaskId) -> String {
        format!("{}/{TODOS}/{id}", self.base_url)
    }

    /// Fetch every task owned by `owner`.
    ///
    /// # Errors
    /// Returns an error on transport failure, non-success status or an undecodable body.
    pub async fn list_tasks(&self, owner: OwnerId) -> Result<Vec<Task>, RemoteError> {
        let url = self.collection_url();
        debug!(%url, %owner, "GET");
        let response = self
            .http
            .get(&url)
            .query(&[("userId", owner.get())])
            .send()
            .await?;
        let tasks: Vec<Task> = Self::ensure_success("GET", &url, response)?.json().await?;
        debug!(count = tasks.len(), "Fetched tasks");
        Ok(tasks)
    }

    /// Create a task; the service assigns its id.
    ///
    /// # Errors
    /// Returns an error on transport failure, non-success status or an undecodable body.
    pub async fn create_task(&self, task: &NewTask) -> Result<Task, RemoteError> {
        let url = self.collection_url();
        debug!(%url, title = %task.title, "POST");
        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .json(task)
            .send()
            .await?;
        let created: Task = Self::ensure_success("POST", &url, response)?.json().await?;
        info!(task = %created.id, "Created remote task");
        Ok(created)
    }

    /// Replace a task and return the stored representation.
    ///
    /// # Errors
    /// Returns an error on transport failure, non-success status or an undecodable body.
    pub async fn update_task(&self, task: &Task) -> Result<Task, RemoteError> {
        let url = self.item_url(task.id);
        debug!(%url, "PATCH");
        let response = self
            .http
            .patch(&url)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .json(task)
            .send()
            .await?;
        Ok(Self::ensure_success("PATCH", &url, response)?.json().await?)
    }

    /// Delete a task.
    ///
    /// # Errors
    /// Returns an error on transport failure or non-success status.
    pub async fn delete_task(&self, id: TaskId) -> Result<(), RemoteError> {
        let url = self.item_url(id);
        debug!(%url, "DELETE");
        let response = self.http.delete(&url).send().await?;
        Self::ensure_success("DELETE", &url, response)?;
        info!(task = %id, "Deleted remote task");
        Ok(())
    }

    fn ensure_success(method: &'static str, url: &str, response: Response) -> Result<Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        warn!(method, %url, status = status.as_u16(), "Request rejected");
        Err(RemoteError::Status {
            method,
            url: url.to_owned(),
            status: status.as_u16(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() -> Result<(), RemoteError> {
        let client = HttpClient::new(" https://example.invalid/api/ ", Duration::from_secs(5))?;
        assert_eq!(client.base_url(), "https://example.invalid/api");
        assert_eq!(client.item_url(TaskId(3)), "https://example.invalid/api/todos/3");
        Ok(())
    }

    #[test]
    fn rejects_unparsable_base_url() {
        let Err(err) = HttpClient::new("not a url", Duration::from_secs(5)) else {
            panic!("invalid URL should error");
        };
        assert!(matches!(err, RemoteError::InvalidBaseUrl { .. }));
    }
}
