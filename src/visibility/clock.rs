use std::time::{Duration, Instant};

use chrono::Utc;

/// Wall-clock and monotonic time, injectable so cycles are deterministic in tests.
///
/// Wall-clock seconds are compared against prediction timestamps. The monotonic
/// reading drives backoff so clock adjustments never change a penalty window.
pub trait Clock {
    fn now_utc(&self) -> i64;
    fn now_monotonic(&self) -> Duration;
}

pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_utc(&self) -> i64 {
        Utc::now().timestamp()
    }

    fn now_monotonic(&self) -> Duration {
        self.origin.elapsed()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_never_goes_backwards() {
        let clock = SystemClock::new();
        let first = clock.now_monotonic();
        let second = clock.now_monotonic();
        assert!(second >= first);
        assert!(clock.now_utc() > 1_600_000_000);
    }
}
