use serde::{Deserialize, Serialize};
use std::num::{NonZeroU64, ParseIntError};
use std::{fmt, str::FromStr};

/// Server-assigned identifier of a task.
///
/// `0` is reserved for the placeholder shown while a create request is in flight
/// and never identifies a committed task.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl TaskId {
    /// Identifier carried by the transient placeholder task.
    pub const PLACEHOLDER: Self = Self(0);

    /// Returns true for the reserved placeholder identifier.
    #[must_use]
    pub const fn is_placeholder(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TaskId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

impl From<u64> for TaskId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Identity under which every task is scoped.
///
/// Zero is not a valid owner, so holding an `OwnerId` proves the identity
/// precondition has been met.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(NonZeroU64);

impl OwnerId {
    /// Build an owner id, rejecting zero.
    #[must_use]
    pub const fn new(value: u64) -> Option<Self> {
        match NonZeroU64::new(value) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }

    /// Raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for OwnerId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_is_zero() {
        assert!(TaskId::PLACEHOLDER.is_placeholder());
        assert!(!TaskId(7).is_placeholder());
    }

    #[test]
    fn owner_rejects_zero() {
        assert!(OwnerId::new(0).is_none());
        assert_eq!(OwnerId::new(2139).map(OwnerId::get), Some(2139));
        assert!("0".parse::<OwnerId>().is_err());
        assert!(serde_json::from_str::<OwnerId>("0").is_err());
    }

    #[test]
    fn task_id_parses_with_whitespace() -> Result<(), ParseIntError> {
        let id: TaskId = " 42 ".parse()?;
        assert_eq!(id, TaskId(42));
        assert_eq!(id.to_string(), "42");
        Ok(())
    }
}
