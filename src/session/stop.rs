use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag shared between threads.
///
/// Starts running; once stopped it never restarts. Stores use `Release` and
/// loads use `Acquire`, so a writer polling the flag sees the flip on its
/// next check.
#[derive(Debug, Clone)]
pub struct StopSignal {
    running: Arc<AtomicBool>,
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl StopSignal {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn is_stopped(&self) -> bool {
        !self.is_running()
    }
}
