//! Application layer for tasksync.
//!
//! This crate owns the optimistic task store, the error notifier, the inline edit
//! state machine and the interaction controller that ties them together for a
//! presentation layer (the CLI, or anything else rendering a [`SessionView`]).

use std::sync::{Mutex, MutexGuard, PoisonError};

pub mod config;
pub mod controller;
pub mod edit;
pub mod notifier;
pub mod remote;
pub mod store;
pub mod view;

// Re-exports for convenience
pub use config::{ApiConfig, ClientConfig, ConfigError, NoticeConfig};
pub use controller::{CommitOutcome, Controller, Focus};
pub use edit::{CommitPlan, EditError, EditPhase, EditSession};
pub use notifier::{DEFAULT_NOTICE_TIMEOUT, ErrorNotifier};
pub use remote::RemoteClient;
pub use store::{BatchOutcome, StoreSnapshot, SyncError, TaskStore};
pub use view::{EditView, SessionView, TaskRow};

/// Lock a mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
