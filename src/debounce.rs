use std::time::{Duration, Instant};

/// A single cancellable delayed task.
///
/// Scheduling while a task is pending replaces it, so a burst of triggers
/// fires once, `delay` after the last one. The owner drives it by calling
/// [`Debouncer::poll`] from its event loop.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    pending_since: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending_since: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending_since.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending_since.map(|since| since + self.delay)
    }

    pub fn schedule(&mut self, now: Instant) {
        self.pending_since = Some(now);
    }

    pub fn cancel(&mut self) -> bool {
        self.pending_since.take().is_some()
    }

    /// Returns `true` exactly once when the quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> bool {
        let ready = self
            .pending_since
            .map(|since| now.saturating_duration_since(since) >= self.delay)
            .unwrap_or(false);
        if ready {
            self.pending_since = None;
        }
        ready
    }

    /// Fires a pending task immediately.
    pub fn flush(&mut self) -> bool {
        self.cancel()
    }
}
