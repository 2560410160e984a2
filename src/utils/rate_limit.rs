use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

/// Spaces outbound requests at least `spacing` apart, across all tasks.
///
/// Callers reserve the next free slot under the lock and then sleep outside
/// it, so concurrent workers queue up in arrival order instead of bursting.
#[derive(Debug)]
pub struct RateLimiter {
    /// Minimum gap between two granted requests
    spacing: Duration,
    /// Earliest instant the next request may start
    next_slot: Mutex<Instant>,
}

impl RateLimiter {
    /// Creates a limiter. A zero `spacing` never waits.
    #[must_use]
    pub fn new(spacing: Duration) -> Self {
        Self {
            spacing,
            next_slot: Mutex::new(Instant::now()),
        }
    }

    /// Waits until this caller may issue a request.
    pub async fn acquire(&self) {
        if self.spacing.is_zero() {
            return;
        }
        let slot = {
            let mut next = self.next_slot.lock().await;
            let slot = (*next).max(Instant::now());
            *next = slot + self.spacing;
            slot
        };
        sleep_until(slot).await;
    }

    /// Configured spacing
    #[must_use]
    pub const fn spacing(&self) -> Duration {
        self.spacing
    }
}
