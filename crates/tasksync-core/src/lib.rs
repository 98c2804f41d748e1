//! Domain types & visibility rules for tasksync.

/// Identifier types.
pub mod id;
/// User-facing failure classifications.
pub mod notice;

use crate::id::{OwnerId, TaskId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use crate::notice::ErrorKind;

/// A single to-do entry as stored by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Server-assigned identifier (`0` only for the placeholder).
    pub id: TaskId,
    /// Human-readable title.
    pub title: String,
    /// Completion flag.
    pub completed: bool,
    /// Owner the task is scoped to.
    #[serde(rename = "userId")]
    pub owner: OwnerId,
}

impl Task {
    /// Transient entry rendered while a create request is unresolved.
    #[must_use]
    pub fn placeholder(title: impl Into<String>, owner: OwnerId) -> Self {
        Self {
            id: TaskId::PLACEHOLDER,
            title: title.into(),
            completed: false,
            owner,
        }
    }

    /// Full replacement of this task with a different completion flag.
    #[must_use]
    pub fn with_completed(&self, completed: bool) -> Self {
        Self {
            completed,
            ..self.clone()
        }
    }

    /// Full replacement of this task with a different title.
    #[must_use]
    pub fn with_title(&self, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..self.clone()
        }
    }

    /// Returns true when the task is not completed yet.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !self.completed
    }
}

/// Create payload: a task without its identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    /// Normalized (trimmed) title.
    pub title: String,
    /// Completion flag, always `false` for fresh tasks.
    pub completed: bool,
    /// Owner the task is created for.
    #[serde(rename = "userId")]
    pub owner: OwnerId,
}

impl NewTask {
    /// Payload for a fresh, active task.
    #[must_use]
    pub fn active(title: impl Into<String>, owner: OwnerId) -> Self {
        Self {
            title: title.into(),
            completed: false,
            owner,
        }
    }
}

/// Currently selected visibility partition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Every task.
    #[default]
    All,
    /// Tasks that are not completed.
    Active,
    /// Completed tasks.
    Completed,
}

impl FilterMode {
    /// Every mode in display order.
    pub const ALL: [Self; 3] = [Self::All, Self::Active, Self::Completed];

    /// Lowercase name used on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }

    /// Returns true when the task belongs to this partition.
    #[must_use]
    pub const fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Active => !task.completed,
            Self::Completed => task.completed,
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a filter name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown filter '{0}' (expected all, active or completed)")]
pub struct ParseFilterModeError(String);

impl FromStr for FilterMode {
    type Err = ParseFilterModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseFilterModeError(s.to_owned()))
    }
}

/// Tasks visible under `mode`, in collection order.
#[must_use]
pub fn visible(tasks: &[Task], mode: FilterMode) -> Vec<&Task> {
    tasks.iter().filter(|task| mode.matches(task)).collect()
}

/// Aggregate counters derived from a collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskCounts {
    /// Number of tasks.
    pub total: usize,
    /// Tasks not completed yet.
    pub active: usize,
    /// Completed tasks.
    pub completed: usize,
}

impl TaskCounts {
    /// Count the given collection.
    #[must_use]
    pub fn of(tasks: &[Task]) -> Self {
        let completed = tasks.iter().filter(|task| task.completed).count();
        Self {
            total: tasks.len(),
            active: tasks.len() - completed,
            completed,
        }
    }

    /// True when no task is active; vacuously true for an empty collection.
    #[must_use]
    pub const fn all_completed(&self) -> bool {
        self.active == 0
    }

    /// True when at least one task could be cleared.
    #[must_use]
    pub const fn has_completed(&self) -> bool {
        self.completed > 0
    }
}
