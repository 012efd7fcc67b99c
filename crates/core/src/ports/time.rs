use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Clock abstraction for testability
pub trait Clock: Send + Sync {
    /// Current time as Unix milliseconds. Must never go backwards, since the
    /// core schedules reconnect and toast deadlines against it.
    fn now_ms(&self) -> i64;
}

/// System clock: wall time read once at construction, advanced by a
/// monotonic `Instant` so later wall-clock jumps do not move deadlines.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    wall_anchor: Duration,
    mono_anchor: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            wall_anchor: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default(),
            mono_anchor: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        (self.wall_anchor + self.mono_anchor.elapsed()).as_millis() as i64
    }
}
