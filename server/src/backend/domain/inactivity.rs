//! Signs the user out after a period without activity.

use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::synchronizer::ExpenseSynchronizer;

pub const DEFAULT_INACTIVITY_TIMEOUT: Duration = Duration::from_secs(6 * 60 * 60);

/// Handle to the background watcher. Dropping it stops the watcher.
pub struct InactivityMonitor {
    activity: watch::Sender<Instant>,
    timeout: Duration,
}

impl InactivityMonitor {
    /// Start watching; must be called inside a tokio runtime
    pub fn spawn(synchronizer: ExpenseSynchronizer, timeout: Duration) -> Self {
        let (activity, rx) = watch::channel(Instant::now());
        tokio::spawn(watch_inactivity(synchronizer, rx, timeout));
        Self { activity, timeout }
    }

    pub fn record_activity(&self) {
        self.activity.send_replace(Instant::now());
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

async fn watch_inactivity(
    synchronizer: ExpenseSynchronizer,
    mut activity: watch::Receiver<Instant>,
    timeout: Duration,
) {
    loop {
        let deadline = *activity.borrow_and_update() + timeout;
        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => {
                if let Some(user_id) = synchronizer.current_user() {
                    warn!("No activity from {} for {:?}, signing out", user_id, timeout);
                    synchronizer.sign_out();
                }
                // Nothing to do until someone is active again
                if activity.changed().await.is_err() {
                    break;
                }
            }
            changed = activity.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
    debug!("Inactivity monitor stopped");
}
