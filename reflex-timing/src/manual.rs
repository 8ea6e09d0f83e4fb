use crate::timer::{FrameTimingStats, Timer, push_frame};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Timer whose clock only moves when told to.
///
/// Clones share the same clock, so a test can hand one copy to a game and keep
/// another to advance time.
#[derive(Debug, Clone, Default)]
pub struct ManualTimer {
    now_ns: Arc<AtomicU64>,
    frame_times: Vec<Duration>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, d: Duration) {
        self.now_ns.fetch_add(d.as_nanos() as u64, Ordering::SeqCst);
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    pub fn set(&self, now_ns: u64) {
        self.now_ns.store(now_ns, Ordering::SeqCst);
    }
}

impl Timer for ManualTimer {
    fn now(&self) -> u64 {
        self.now_ns.load(Ordering::SeqCst)
    }

    fn record_frame(&mut self, d: Duration) {
        push_frame(&mut self.frame_times, 1000, d);
    }

    fn frame_count(&self) -> usize {
        self.frame_times.len()
    }

    fn frame_stats(&self) -> FrameTimingStats {
        FrameTimingStats::from_frames(&self.frame_times)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_clock() {
        let timer = ManualTimer::new();
        let game_copy = timer.clone();
        timer.advance_ms(1500);
        assert_eq!(game_copy.now(), 1_500_000_000);
        assert_eq!(game_copy.elapsed(500_000_000), Duration::from_secs(1));
    }

    #[test]
    fn elapsed_saturates() {
        let timer = ManualTimer::new();
        timer.set(10);
        assert_eq!(timer.elapsed(20), Duration::ZERO);
    }
}
