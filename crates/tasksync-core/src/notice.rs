use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a user-facing failure.
///
/// At most one classification is active at a time; "no error" is `Option::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The initial fetch of the collection failed.
    Loading,
    /// Creating a task failed.
    Adding,
    /// Updating a task failed.
    Updating,
    /// Deleting a task failed.
    Deleting,
    /// A blank title was submitted; no remote call was attempted.
    EmptyTitle,
}

impl ErrorKind {
    /// Single-line message shown to the user.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Loading => "Unable to load todos",
            Self::Adding => "Unable to add a todo",
            Self::Updating => "Unable to update a todo",
            Self::Deleting => "Unable to delete a todo",
            Self::EmptyTitle => "Title should not be empty",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}
