//! Trailing-edge debouncer for mutation-triggered rescans.

use std::time::Duration;
use tokio::time::Instant;

/// Fires once after `quiet` has elapsed since the most recent event.
#[derive(Debug, Clone)]
pub struct Debouncer {
    quiet: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    /// A debouncer with the given quiet period.
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            deadline: None,
        }
    }

    /// The quiet period.
    pub fn quiet(&self) -> Duration {
        self.quiet
    }

    /// Record an event at `now`, pushing the deadline out.
    pub fn schedule(&mut self, now: Instant) -> Instant {
        let deadline = now + self.quiet;
        self.deadline = Some(deadline);
        deadline
    }

    /// Drop the pending deadline.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// When the pending fire is due.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether a fire is pending.
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Consume the deadline if it has passed.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_events_reset_the_timer() {
        let mut debouncer = Debouncer::new(Duration::from_millis(500));
        debouncer.schedule(Instant::now());

        tokio::time::advance(Duration::from_millis(300)).await;
        assert!(!debouncer.fire_if_due(Instant::now()));
        debouncer.schedule(Instant::now());

        tokio::time::advance(Duration::from_millis(300)).await;
        assert!(!debouncer.fire_if_due(Instant::now()));

        tokio::time::advance(Duration::from_millis(200)).await;
        assert!(debouncer.fire_if_due(Instant::now()));
        assert!(!debouncer.is_armed());
        assert!(!debouncer.fire_if_due(Instant::now()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel() {
        let mut debouncer = Debouncer::new(Duration::from_millis(10));
        debouncer.schedule(Instant::now());
        debouncer.cancel();
        tokio::time::advance(Duration::from_millis(50)).await;
        assert!(!debouncer.fire_if_due(Instant::now()));
    }
}
