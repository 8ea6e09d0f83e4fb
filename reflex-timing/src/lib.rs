pub mod manual;
pub mod timer;

pub use manual::ManualTimer;
pub use timer::{FrameTimingStats, HighPrecisionTimer, Timer};

/// Nanoseconds per millisecond, for converting `Timer::now` stamps
pub const NANOS_PER_MILLI: u64 = 1_000_000;
/// Nanoseconds per second
pub const NANOS_PER_SEC: u64 = 1_000_000_000;

/// `ms` milliseconds in nanoseconds, clamped at `u64::MAX`
pub fn ms_to_nanos(ms: u64) -> u64 {
    ms.saturating_mul(NANOS_PER_MILLI)
}

/// Timestamp `ms` milliseconds after `now`; saturates instead of wrapping
pub fn after_ms(now: u64, ms: u64) -> u64 {
    now.saturating_add(ms_to_nanos(ms))
}
