use reflex_timing::NANOS_PER_SEC;

/// One-second countdown, the way a repeating 1 s tick would drive it.
///
/// Ticks are counted from the start stamp, so a late poll catches up on every
/// whole second that has passed.
#[derive(Debug, Clone)]
pub struct Countdown {
    duration: u32,
    time_left: u32,
    started_at: u64,
}

impl Countdown {
    pub fn new(duration: u32) -> Self {
        Self {
            duration,
            time_left: duration,
            started_at: 0,
        }
    }

    pub fn start(&mut self, now: u64) {
        self.time_left = self.duration;
        self.started_at = now;
    }

    /// Applies pending ticks; returns true if `time_left` changed
    pub fn poll(&mut self, now: u64) -> bool {
        let ticks = (now.saturating_sub(self.started_at) / NANOS_PER_SEC).min(self.duration as u64);
        let left = self.duration - ticks as u32;
        if left != self.time_left {
            self.time_left = left;
            true
        } else {
            false
        }
    }

    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    /// Whole seconds ticked off so far
    pub fn elapsed_secs(&self) -> u32 {
        self.duration - self.time_left
    }

    pub fn expired(&self) -> bool {
        self.time_left == 0
    }
}
