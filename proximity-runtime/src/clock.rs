//! Time source for the control loop

use chrono::Utc;

/// Supplies "now" in milliseconds since the Unix epoch
pub trait Clock: Send + 'static {
    fn now_ms(&self) -> u64;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        // Before 1970 only on a badly broken host
        u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
    }
}

impl<F> Clock for F
where
    F: Fn() -> u64 + Send + 'static,
{
    fn now_ms(&self) -> u64 {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_recent() {
        // 2020-01-01T00:00:00Z
        assert!(SystemClock.now_ms() > 1_577_836_800_000);
    }

    #[test]
    fn test_closure_clock() {
        let fixed = || 42u64;
        assert_eq!(fixed.now_ms(), 42);
    }
}
