//! Single-slot error notification with timed auto-dismiss.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tasksync_core::ErrorKind;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::lock;

/// Default lifetime of a notification.
pub const DEFAULT_NOTICE_TIMEOUT: Duration = Duration::from_millis(3000);

/// Holds at most one active [`ErrorKind`].
///
/// Raising a classification (the same one or a different one) replaces the current one
/// and restarts the expiry timer; timers never stack. Requires a Tokio runtime for the
/// timer; without one the classification stays until dismissed.
#[derive(Debug)]
pub struct ErrorNotifier {
    shared: Arc<Shared>,
    timer: Mutex<Option<JoinHandle<()>>>,
    timeout: Duration,
}

#[derive(Debug)]
struct Shared {
    tx: watch::Sender<Option<ErrorKind>>,
    generation: AtomicU64,
}

impl ErrorNotifier {
    /// Create a notifier whose notifications expire after `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            shared: Arc::new(Shared {
                tx,
                generation: AtomicU64::new(0),
            }),
            timer: Mutex::new(None),
            timeout,
        }
    }

    /// Currently active classification.
    #[must_use]
    pub fn current(&self) -> Option<ErrorKind> {
        *self.shared.tx.borrow()
    }

    /// Observe classification changes (including expiry).
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<ErrorKind>> {
        self.shared.tx.subscribe()
    }

    /// Show `kind`, replacing any active classification and restarting the timer.
    pub fn raise(&self, kind: ErrorKind) {
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.tx.send_replace(Some(kind));
        debug!(?kind, "Raised notification");

        let mut timer = lock(&self.timer);
        if let Some(previous) = timer.take() {
            previous.abort();
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(?kind, "No runtime available, notification will not expire");
            return;
        };
        let shared = Arc::clone(&self.shared);
        let deadline = Instant::now() + self.timeout;
        *timer = Some(handle.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            shared.expire(generation);
        }));
    }

    /// Clear the active classification immediately and cancel its timer.
    pub fn dismiss(&self) {
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(previous) = lock(&self.timer).take() {
            previous.abort();
        }
        self.shared.tx.send_replace(None);
    }
}

impl Default for ErrorNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_NOTICE_TIMEOUT)
    }
}

impl Drop for ErrorNotifier {
    fn drop(&mut self) {
        if let Some(timer) = lock(&self.timer).take() {
            timer.abort();
        }
    }
}

impl Shared {
    fn expire(&self, generation: u64) {
        // A raise or dismiss after this timer was armed owns the slot now.
        if self.generation.load(Ordering::SeqCst) == generation {
            self.tx.send_replace(None);
        }
    }
}
