//! Per-turn deadline that cancels the in-flight request.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parley_providers::CancellationToken;
use tokio::task::JoinHandle;

/// Sleeps for the turn deadline, then records that it fired and cancels.
///
/// The flag is set before the token is cancelled, so an abort observed by the
/// transport can be attributed to the deadline. Dropping the timer aborts the
/// sleeping task; a timer that has not fired by then never will.
#[derive(Debug)]
pub(crate) struct DeadlineTimer {
    fired: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl DeadlineTimer {
    pub(crate) fn start(after: Duration, token: CancellationToken) -> Self {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        let task = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            flag.store(true, Ordering::SeqCst);
            token.cancel();
        });
        Self { fired, task }
    }

    pub(crate) fn fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    /// Stop the timer if still pending. Returns whether it had fired.
    pub(crate) fn cancel(self) -> bool {
        self.task.abort();
        self.fired()
    }
}

impl Drop for DeadlineTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
