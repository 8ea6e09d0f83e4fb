use std::time::{Duration, Instant};

/// Monotonic clock the tests schedule their deadlines against.
///
/// Timestamps are nanoseconds since the timer was created.
pub trait Timer: Clone + Send + Sync {
    fn now(&self) -> u64;
    fn elapsed(&self, since: u64) -> Duration {
        Duration::from_nanos(self.now().saturating_sub(since))
    }
    fn record_frame(&mut self, d: Duration);
    fn frame_count(&self) -> usize;
    fn frame_stats(&self) -> FrameTimingStats;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameTimingStats {
    pub average_frame_time_ns: f64,
    pub jitter_ns: f64,
    pub min_frame_time_ns: f64,
    pub max_frame_time_ns: f64,
    pub effective_fps: f64,
}

impl FrameTimingStats {
    /// Mean, standard deviation and range of the recorded frame durations
    pub fn from_frames(frames: &[Duration]) -> Self {
        if frames.is_empty() {
            return Self::default();
        }
        let times: Vec<f64> = frames.iter().map(|d| d.as_nanos() as f64).collect();
        let avg = times.iter().sum::<f64>() / times.len() as f64;
        let var = times.iter().map(|x| (x - avg).powi(2)).sum::<f64>() / times.len() as f64;
        let min = times.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = times.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        Self {
            average_frame_time_ns: avg,
            jitter_ns: var.sqrt(),
            min_frame_time_ns: min,
            max_frame_time_ns: max,
            effective_fps: if avg > 0.0 { 1e9 / avg } else { 0.0 },
        }
    }
}

/// Keeps the last `max_samples` frame durations in a rolling window
pub(crate) fn push_frame(frames: &mut Vec<Duration>, max_samples: usize, d: Duration) {
    if frames.len() >= max_samples {
        frames.remove(0);
    }
    frames.push(d);
}

#[derive(Debug, Clone)]
pub struct HighPrecisionTimer {
    pub start: Instant,
    pub frame_times: Vec<Duration>,
    pub max_samples: usize,
}

impl Timer for HighPrecisionTimer {
    fn now(&self) -> u64 {
        self.start.elapsed().as_nanos() as u64
    }

    fn record_frame(&mut self, d: Duration) {
        push_frame(&mut self.frame_times, self.max_samples, d);
    }

    fn frame_count(&self) -> usize {
        self.frame_times.len()
    }

    fn frame_stats(&self) -> FrameTimingStats {
        FrameTimingStats::from_frames(&self.frame_times)
    }
}

impl HighPrecisionTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            frame_times: Vec::with_capacity(1000),
            max_samples: 1000,
        }
    }
}

impl Default for HighPrecisionTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_is_monotonic() {
        let timer = HighPrecisionTimer::new();
        let a = timer.now();
        let b = timer.now();
        assert!(b >= a);
    }

    #[test]
    fn frame_window_is_bounded() {
        let mut timer = HighPrecisionTimer::new();
        timer.max_samples = 3;
        for ms in 1..=5 {
            timer.record_frame(Duration::from_millis(ms));
        }
        assert_eq!(timer.frame_count(), 3);
        assert_eq!(timer.frame_times[0], Duration::from_millis(3));
    }

    #[test]
    fn stats_of_steady_frames() {
        let frames = vec![Duration::from_millis(10); 4];
        let stats = FrameTimingStats::from_frames(&frames);
        assert_eq!(stats.average_frame_time_ns, 10_000_000.0);
        assert_eq!(stats.jitter_ns, 0.0);
        assert!((stats.effective_fps - 100.0).abs() < 1e-9);
    }

    #[test]
    fn stats_of_no_frames_are_zero() {
        assert_eq!(FrameTimingStats::from_frames(&[]), FrameTimingStats::default());
    }
}
