//! Shell chrome timers: auto-hide controls and the load watchdog.

use std::time::{Duration, Instant};

/// Idle timeout after which fullscreen controls hide.
pub const CONTROLS_HIDE_TIMEOUT: Duration = Duration::from_secs(3);

/// Upper bound on resolution/prefetch before the session is forced into an
/// error state. The source material wavered between 15 and 20 seconds; we
/// standardize on 20.
pub const WATCHDOG_TIMEOUT: Duration = Duration::from_secs(20);

/// Cancellable one-shot deadline, re-armed on every qualifying input event.
/// Must be cancelled on teardown so it cannot act on a closed session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdleTimer {
    deadline: Option<Instant>,
}

impl IdleTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, now: Instant, timeout: Duration) {
        self.deadline = Some(now + timeout);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Fires at most once: returns true when the deadline has passed and
    /// disarms itself.
    pub fn fire_if_expired(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Forces an error state when a pending operation never resolves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Watchdog {
    deadline: Option<Instant>,
}

impl Watchdog {
    pub fn start(now: Instant) -> Self {
        Self {
            deadline: Some(now + WATCHDOG_TIMEOUT),
        }
    }

    pub fn disarm(&mut self) {
        self.deadline = None;
    }

    pub fn expired(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_timer_fires_once_after_timeout() {
        let now = Instant::now();
        let mut timer = IdleTimer::new();
        timer.arm(now, CONTROLS_HIDE_TIMEOUT);

        assert!(!timer.fire_if_expired(now + Duration::from_secs(2)));
        assert!(timer.fire_if_expired(now + Duration::from_secs(3)));
        assert!(!timer.fire_if_expired(now + Duration::from_secs(10)));
    }

    #[test]
    fn rearming_pushes_the_deadline() {
        let now = Instant::now();
        let mut timer = IdleTimer::new();
        timer.arm(now, CONTROLS_HIDE_TIMEOUT);
        timer.arm(now + Duration::from_secs(2), CONTROLS_HIDE_TIMEOUT);

        assert!(!timer.fire_if_expired(now + Duration::from_secs(4)));
        assert!(timer.fire_if_expired(now + Duration::from_secs(5)));
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let now = Instant::now();
        let mut timer = IdleTimer::new();
        timer.arm(now, CONTROLS_HIDE_TIMEOUT);
        timer.cancel();
        assert!(!timer.is_armed());
        assert!(!timer.fire_if_expired(now + Duration::from_secs(60)));
    }

    #[test]
    fn watchdog_expires_after_twenty_seconds() {
        let now = Instant::now();
        let watchdog = Watchdog::start(now);
        assert!(!watchdog.expired(now + Duration::from_secs(19)));
        assert!(watchdog.expired(now + Duration::from_secs(20)));
    }

    #[test]
    fn disarmed_watchdog_never_expires() {
        let now = Instant::now();
        let mut watchdog = Watchdog::start(now);
        watchdog.disarm();
        assert!(!watchdog.expired(now + Duration::from_secs(60)));
    }
}
