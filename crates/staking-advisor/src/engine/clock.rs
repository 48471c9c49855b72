//! Time source for recency checks

use chrono::Utc;

/// Current time in nanoseconds since the Unix epoch
pub trait Clock: Send + Sync {
    fn now_nanos(&self) -> u64;
}

/// Wall clock
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_nanos(&self) -> u64 {
        Utc::now()
            .timestamp_nanos_opt()
            .and_then(|nanos| u64::try_from(nanos).ok())
            .unwrap_or(0)
    }
}

/// Clock frozen at one instant
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(u64);

impl FixedClock {
    pub const fn new(now_nanos: u64) -> Self {
        Self(now_nanos)
    }
}

impl Clock for FixedClock {
    fn now_nanos(&self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_after_2020() {
        assert!(SystemClock.now_nanos() > 1_577_836_800_000_000_000);
    }

    #[test]
    fn test_fixed_clock() {
        assert_eq!(FixedClock::new(42).now_nanos(), 42);
    }
}
