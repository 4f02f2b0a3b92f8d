//! Monotonic millisecond clock shared by the bundled transports

use tokio::time::Instant;

/// Milliseconds elapsed since the clock was created
///
/// Backed by tokio's clock, so it follows paused time in tests.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    epoch: Instant,
}

impl Clock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }

    pub fn now_millis(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_clock_follows_tokio_time() {
        let clock = Clock::new();
        assert_eq!(clock.now_millis(), 0);

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        let now = clock.now_millis();
        assert!((1_500..1_502).contains(&now), "now = {}", now);
    }
}
