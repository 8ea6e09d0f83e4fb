use crate::config::ReactionConfig;
use crate::{SkillTest, TestEvent};
use rand::Rng;
use reflex_core::{TestKind, TestStatus, TestSummary, average};
use reflex_timing::{NANOS_PER_MILLI, NANOS_PER_SEC, Timer, after_ms};
use tracing::{debug, info};

/// What the reaction box is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Signal {
    /// Before the first click
    #[default]
    Idle,
    /// Red, signal pending; clicking now is a false start
    Waiting,
    /// Green; the next click is measured
    Ready,
    /// Penalty pause after a false start; the signal is cleared but the
    /// round still counts as waiting
    FalseStart,
    /// Pause between a measured round and the next one
    Cooldown,
    Completed,
}

#[derive(Debug, Clone, Default)]
pub struct ReactionState {
    pub attempts: u32,
    pub max_attempts: u32,
    pub times: Vec<u64>,
    pub false_starts: u32,
    /// When the current signal turned green
    pub start_time: Option<u64>,
    pub waiting: bool,
    pub test_start_time: Option<u64>,
}

pub struct ReactionTest<T: Timer, R: Rng> {
    pub config: ReactionConfig,
    timer: T,
    rng: R,
    status: TestStatus,
    state: ReactionState,
    signal: Signal,
    /// When the current signal state runs out (Waiting, FalseStart, Cooldown)
    deadline: Option<u64>,
    last_time: Option<u64>,
    test_duration_secs: Option<f64>,
}

impl<T: Timer, R: Rng> ReactionTest<T, R> {
    pub fn new(config: ReactionConfig, timer: T, rng: R) -> Self {
        let state = ReactionState {
            max_attempts: config.max_attempts,
            ..ReactionState::default()
        };
        Self {
            config,
            timer,
            rng,
            status: TestStatus::Idle,
            state,
            signal: Signal::Idle,
            deadline: None,
            last_time: None,
            test_duration_secs: None,
        }
    }

    pub fn state(&self) -> &ReactionState {
        &self.state
    }

    pub fn signal(&self) -> Signal {
        self.signal
    }

    /// Latency of the most recent measured round, in ms
    pub fn last_time(&self) -> Option<u64> {
        self.last_time
    }

    pub fn average_ms(&self) -> Option<f64> {
        average(&self.state.times)
    }

    pub fn test_duration_secs(&self) -> Option<f64> {
        self.test_duration_secs
    }

    fn begin_round(&mut self, now: u64) {
        let (min, max) = self.config.delay_range_ms;
        let delay_ms = if min < max {
            self.rng.random_range(min..max)
        } else {
            min
        };
        self.state.waiting = true;
        self.signal = Signal::Waiting;
        self.deadline = Some(after_ms(now, delay_ms));
        debug!("Round {} armed, signal in {} ms", self.state.attempts + 1, delay_ms);
    }

    fn complete(&mut self, now: u64) {
        self.status = TestStatus::Completed;
        self.signal = Signal::Completed;
        self.deadline = None;
        let start = self.state.test_start_time.unwrap_or(now);
        let duration = now.saturating_sub(start) as f64 / NANOS_PER_SEC as f64;
        self.test_duration_secs = Some(duration);
        info!(
            "Reaction test completed: average {:.0} ms, {} false starts",
            self.average_ms().unwrap_or_default(),
            self.state.false_starts
        );
    }
}

impl<T: Timer, R: Rng> SkillTest for ReactionTest<T, R> {
    fn kind(&self) -> TestKind {
        TestKind::Reaction
    }

    fn status(&self) -> TestStatus {
        self.status
    }

    fn start(&mut self) {
        let now = self.timer.now();
        self.state = ReactionState {
            max_attempts: self.config.max_attempts,
            test_start_time: Some(now),
            ..ReactionState::default()
        };
        self.status = TestStatus::Running;
        self.last_time = None;
        self.test_duration_secs = None;
        info!("Reaction test started ({} attempts)", self.config.max_attempts);
        self.begin_round(now);
    }

    fn handle_click(&mut self, _pos: (f32, f32)) -> Option<TestEvent> {
        if self.state.attempts >= self.state.max_attempts {
            return None;
        }

        if self.state.waiting {
            let now = self.timer.now();
            self.state.false_starts += 1;
            // still waiting: an early click during the penalty is another false start
            self.signal = Signal::FalseStart;
            self.deadline = Some(after_ms(now, self.config.false_start_penalty_ms));
            debug!("False start ({} total)", self.state.false_starts);
            return Some(TestEvent::FalseStart {
                total: self.state.false_starts,
            });
        }

        match self.signal {
            Signal::Idle => {
                self.start();
                Some(TestEvent::Started)
            }
            Signal::Ready => {
                let now = self.timer.now();
                let shown_at = self.state.start_time.unwrap_or(now);
                let latency_ms = now.saturating_sub(shown_at) / NANOS_PER_MILLI;
                self.state.times.push(latency_ms);
                self.state.attempts += 1;
                self.last_time = Some(latency_ms);
                debug!(
                    "Reaction {} of {}: {} ms",
                    self.state.attempts, self.state.max_attempts, latency_ms
                );

                if self.state.attempts < self.state.max_attempts {
                    self.signal = Signal::Cooldown;
                    self.deadline = Some(after_ms(now, self.config.inter_round_ms));
                } else {
                    self.complete(now);
                }
                Some(TestEvent::Reaction { latency_ms })
            }
            Signal::Waiting | Signal::FalseStart | Signal::Cooldown | Signal::Completed => None,
        }
    }

    fn update(&mut self) -> Vec<TestEvent> {
        let mut events = Vec::new();
        let now = self.timer.now();
        let Some(deadline) = self.deadline else {
            return events;
        };
        if now < deadline {
            return events;
        }

        match self.signal {
            Signal::Waiting => {
                self.signal = Signal::Ready;
                self.state.start_time = Some(now);
                self.state.waiting = false;
                self.deadline = None;
                events.push(TestEvent::SignalShown);
            }
            Signal::FalseStart | Signal::Cooldown => {
                self.begin_round(now);
                events.push(TestEvent::RoundStarted);
            }
            Signal::Idle | Signal::Ready | Signal::Completed => {
                self.deadline = None;
            }
        }
        events
    }

    fn summary(&self) -> Option<TestSummary> {
        if !self.status.is_completed() {
            return None;
        }
        Some(TestSummary::Reaction {
            reaction_times: self.state.times.clone(),
            false_starts: self.state.false_starts,
            test_duration_secs: self.test_duration_secs.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use reflex_timing::ManualTimer;

    fn reaction(max_attempts: u32) -> (ReactionTest<ManualTimer, StdRng>, ManualTimer) {
        let timer = ManualTimer::new();
        let config = ReactionConfig {
            max_attempts,
            ..ReactionConfig::default()
        };
        let test = ReactionTest::new(config, timer.clone(), StdRng::seed_from_u64(42));
        (test, timer)
    }

    /// Advances past the longest possible delay so the signal turns green
    fn wait_for_green(test: &mut ReactionTest<ManualTimer, StdRng>, timer: &ManualTimer) {
        timer.advance_ms(4000);
        assert_eq!(test.update(), vec![TestEvent::SignalShown]);
        assert_eq!(test.signal(), Signal::Ready);
    }

    #[test]
    fn first_click_arms_a_round_within_the_delay_range() {
        let (mut test, timer) = reaction(3);
        assert_eq!(test.handle_click((0.0, 0.0)), Some(TestEvent::Started));
        assert_eq!(test.signal(), Signal::Waiting);
        assert!(test.state().waiting);

        timer.advance_ms(999);
        assert!(test.update().is_empty());
        assert_eq!(test.signal(), Signal::Waiting);

        timer.advance_ms(3001);
        assert_eq!(test.update(), vec![TestEvent::SignalShown]);
        assert!(!test.state().waiting);
    }

    #[test]
    fn click_while_waiting_is_a_false_start() {
        let (mut test, timer) = reaction(3);
        test.start();
        timer.advance_ms(500);

        assert_eq!(
            test.handle_click((0.0, 0.0)),
            Some(TestEvent::FalseStart { total: 1 })
        );
        assert_eq!(test.state().false_starts, 1);
        assert_eq!(test.signal(), Signal::FalseStart);

        assert!(test.state().waiting);

        // the cleared signal does not fire during the penalty
        timer.advance_ms(1499);
        assert!(test.update().is_empty());
        timer.advance_ms(1);
        assert_eq!(test.update(), vec![TestEvent::RoundStarted]);
        assert_eq!(test.signal(), Signal::Waiting);
        assert_eq!(test.state().attempts, 0);
    }

    #[test]
    fn early_click_during_penalty_counts_again_and_restarts_it() {
        let (mut test, timer) = reaction(3);
        test.start();
        timer.advance_ms(100);
        test.handle_click((0.0, 0.0));

        timer.advance_ms(300);
        assert_eq!(
            test.handle_click((0.0, 0.0)),
            Some(TestEvent::FalseStart { total: 2 })
        );
        assert_eq!(test.state().false_starts, 2);
        assert_eq!(test.signal(), Signal::FalseStart);

        // penalty now runs from the second click
        timer.advance_ms(1499);
        assert!(test.update().is_empty());
        timer.advance_ms(1);
        assert_eq!(test.update(), vec![TestEvent::RoundStarted]);
        assert_eq!(test.signal(), Signal::Waiting);
    }

    #[test]
    fn click_on_green_is_measured_and_not_a_false_start() {
        let (mut test, timer) = reaction(3);
        test.start();
        wait_for_green(&mut test, &timer);

        timer.advance_ms(237);
        assert_eq!(
            test.handle_click((0.0, 0.0)),
            Some(TestEvent::Reaction { latency_ms: 237 })
        );
        assert_eq!(test.state().times, vec![237]);
        assert_eq!(test.state().attempts, 1);
        assert_eq!(test.state().false_starts, 0);
        assert_eq!(test.last_time(), Some(237));
        assert_eq!(test.signal(), Signal::Cooldown);
    }

    #[test]
    fn cooldown_clicks_are_ignored_then_next_round_arms() {
        let (mut test, timer) = reaction(3);
        test.start();
        wait_for_green(&mut test, &timer);
        timer.advance_ms(200);
        test.handle_click((0.0, 0.0));

        timer.advance_ms(300);
        assert_eq!(test.handle_click((0.0, 0.0)), None);
        assert_eq!(test.state().false_starts, 0);

        timer.advance_ms(700);
        assert_eq!(test.update(), vec![TestEvent::RoundStarted]);
        assert!(test.state().waiting);
    }

    #[test]
    fn completes_after_max_attempts_with_average() {
        let (mut test, timer) = reaction(3);
        test.start();
        for latency in [200, 300, 400] {
            wait_for_green(&mut test, &timer);
            timer.advance_ms(latency);
            test.handle_click((0.0, 0.0));
            timer.advance_ms(1000);
            test.update();
        }

        assert_eq!(test.status(), TestStatus::Completed);
        assert_eq!(test.signal(), Signal::Completed);
        assert_eq!(test.average_ms(), Some(300.0));
        assert_eq!(test.handle_click((0.0, 0.0)), None);

        match test.summary() {
            Some(TestSummary::Reaction {
                reaction_times,
                false_starts,
                test_duration_secs,
            }) => {
                assert_eq!(reaction_times, vec![200, 300, 400]);
                assert_eq!(false_starts, 0);
                assert!(test_duration_secs > 12.0);
            }
            other => panic!("unexpected summary {other:?}"),
        }
    }

    #[test]
    fn fixed_delay_range_does_not_panic() {
        let timer = ManualTimer::new();
        let config = ReactionConfig {
            delay_range_ms: (1200, 1200),
            ..ReactionConfig::default()
        };
        let mut test = ReactionTest::new(config, timer.clone(), StdRng::seed_from_u64(1));
        test.start();
        timer.advance_ms(1199);
        assert!(test.update().is_empty());
        timer.advance_ms(1);
        assert_eq!(test.update(), vec![TestEvent::SignalShown]);
    }

    #[test]
    fn no_summary_before_completion() {
        let (mut test, _timer) = reaction(3);
        assert!(test.summary().is_none());
        test.start();
        assert!(test.summary().is_none());
        assert_eq!(test.average_ms(), None);
    }
}
