use crate::config::ClickConfig;
use crate::countdown::Countdown;
use crate::{SkillTest, TestEvent};
use reflex_core::{ClickResults, TestKind, TestStatus, TestSummary, clicks_per_minute};
use reflex_timing::{NANOS_PER_MILLI, NANOS_PER_SEC, Timer, after_ms, ms_to_nanos};
use tracing::{debug, info};

#[derive(Debug, Clone, Default)]
pub struct ClickState {
    pub clicks: u32,
    /// Clicks that landed under the error threshold after the previous one
    pub errors: u32,
    pub active: bool,
    pub last_click_time: u64,
    pub test_start_time: Option<u64>,
}

pub struct ClickTest<T: Timer> {
    pub config: ClickConfig,
    timer: T,
    status: TestStatus,
    state: ClickState,
    countdown: Countdown,
    flash_until: Option<u64>,
    test_duration_secs: Option<f64>,
}

impl<T: Timer> ClickTest<T> {
    pub fn new(config: ClickConfig, timer: T) -> Self {
        let countdown = Countdown::new(config.duration_secs);
        Self {
            config,
            timer,
            status: TestStatus::Idle,
            state: ClickState::default(),
            countdown,
            flash_until: None,
            test_duration_secs: None,
        }
    }

    pub fn state(&self) -> &ClickState {
        &self.state
    }

    pub fn time_left(&self) -> u32 {
        self.countdown.time_left()
    }

    /// Clicks per minute over the seconds ticked off so far
    pub fn cpm(&self) -> u32 {
        clicks_per_minute(self.state.clicks, self.countdown.elapsed_secs())
    }

    /// True while the click feedback flash is showing
    pub fn flashing(&self) -> bool {
        self.flash_until.is_some()
    }

    pub fn test_duration_secs(&self) -> Option<f64> {
        self.test_duration_secs
    }

    fn end(&mut self, now: u64) {
        self.state.active = false;
        self.status = TestStatus::Completed;
        self.flash_until = None;
        let start = self.state.test_start_time.unwrap_or(now);
        let duration = now.saturating_sub(start) as f64 / NANOS_PER_SEC as f64;
        self.test_duration_secs = Some(duration);
        info!(
            "Click test completed: {} clicks ({} errors) in {} s",
            self.state.clicks, self.state.errors, self.config.duration_secs
        );
    }
}

impl<T: Timer> SkillTest for ClickTest<T> {
    fn kind(&self) -> TestKind {
        TestKind::Click
    }

    fn status(&self) -> TestStatus {
        self.status
    }

    fn start(&mut self) {
        let now = self.timer.now();
        self.state = ClickState {
            active: true,
            last_click_time: now,
            test_start_time: Some(now),
            ..ClickState::default()
        };
        self.status = TestStatus::Running;
        self.countdown = Countdown::new(self.config.duration_secs);
        self.countdown.start(now);
        self.flash_until = None;
        self.test_duration_secs = None;
        info!("Click test started ({} s)", self.config.duration_secs);
    }

    fn handle_click(&mut self, _pos: (f32, f32)) -> Option<TestEvent> {
        match self.status {
            TestStatus::Idle => {
                self.start();
                return Some(TestEvent::Started);
            }
            TestStatus::Completed => return None,
            TestStatus::Running => {}
        }

        let now = self.timer.now();
        let since_last = now.saturating_sub(self.state.last_click_time);
        self.state.clicks += 1;

        let error = since_last < ms_to_nanos(self.config.error_threshold_ms);
        if error {
            self.state.errors += 1;
            debug!("Click {} ms after the previous one", since_last / NANOS_PER_MILLI);
        }
        self.state.last_click_time = now;
        self.flash_until = Some(after_ms(now, self.config.flash_ms));

        Some(TestEvent::Click { error })
    }

    fn update(&mut self) -> Vec<TestEvent> {
        let mut events = Vec::new();
        let now = self.timer.now();

        if self.flash_until.is_some_and(|until| now >= until) {
            self.flash_until = None;
        }

        if self.status.is_running() && self.countdown.poll(now) {
            events.push(TestEvent::Tick {
                time_left: self.countdown.time_left(),
            });
            if self.countdown.expired() {
                self.end(now);
                events.push(TestEvent::Completed);
            }
        }

        events
    }

    fn summary(&self) -> Option<TestSummary> {
        if !self.status.is_completed() {
            return None;
        }
        Some(TestSummary::Click {
            results: ClickResults {
                clicks: self.state.clicks,
                duration: self.config.duration_secs,
                errors: self.state.errors,
            },
            test_duration_secs: self.test_duration_secs.unwrap_or_default(),
        })
    }
}
