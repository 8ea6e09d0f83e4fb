use crate::aim::AimTest;
use crate::click::ClickTest;
use crate::config::GamesConfig;
use crate::error::{ConfigError, SubmitError};
use crate::reaction::ReactionTest;
use crate::sink::ResultsSink;
use crate::{SkillTest, TestEvent};
use rand::{Rng, SeedableRng};
use reflex_core::{SessionPhase, TestKind, TestResults, TestStatus};
use reflex_timing::Timer;
use tracing::{debug, info, warn};

/// Runs the reaction, aim and click tests in order and submits the results.
///
/// The session owns every test and the shared `TestResults`. A test's summary is
/// copied into the results the first time it is seen completed; entering the
/// summary screen submits them through the sink.
pub struct Session<T, R, S>
where
    T: Timer,
    R: Rng + SeedableRng,
    S: ResultsSink,
{
    phase: SessionPhase,
    pub timer: T,
    pub reaction: ReactionTest<T, R>,
    pub aim: AimTest<T, R>,
    pub click: ClickTest<T>,
    results: TestResults,
    sink: S,
    submitted: bool,
    submit_error: Option<String>,
}

impl<T, R, S> Session<T, R, S>
where
    T: Timer,
    R: Rng + SeedableRng,
    S: ResultsSink,
{
    /// `arena` is the size of the aim test area in pixels. The config is
    /// validated here as well, since it need not come from `GamesConfig::load`.
    pub fn new(
        config: GamesConfig,
        timer: T,
        mut rng: R,
        sink: S,
        arena: (f32, f32),
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let reaction = ReactionTest::new(config.reaction, timer.clone(), R::from_rng(&mut rng));
        let aim = AimTest::new(config.aim, timer.clone(), R::from_rng(&mut rng), arena);
        let click = ClickTest::new(config.click, timer.clone());
        Ok(Self {
            phase: SessionPhase::Welcome,
            timer,
            reaction,
            aim,
            click,
            results: TestResults::new(),
            sink,
            submitted: false,
            submit_error: None,
        })
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn results(&self) -> &TestResults {
        &self.results
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn submitted(&self) -> bool {
        self.submitted
    }

    /// Why the last submission failed, for display
    pub fn submit_error(&self) -> Option<&str> {
        self.submit_error.as_deref()
    }

    pub fn set_arena(&mut self, width: f32, height: f32) {
        self.aim.set_arena(width, height);
    }

    fn current_test(&mut self) -> Option<&mut dyn SkillTest> {
        match self.phase.test_kind()? {
            TestKind::Reaction => Some(&mut self.reaction),
            TestKind::Aim => Some(&mut self.aim),
            TestKind::Click => Some(&mut self.click),
        }
    }

    /// Status of the test on the current screen
    pub fn current_status(&self) -> Option<TestStatus> {
        Some(match self.phase.test_kind()? {
            TestKind::Reaction => self.reaction.status(),
            TestKind::Aim => self.aim.status(),
            TestKind::Click => self.click.status(),
        })
    }

    /// Forwards a click in test-area coordinates to the current test
    pub fn handle_click(&mut self, pos: (f32, f32)) -> Option<TestEvent> {
        let event = self.current_test()?.handle_click(pos);
        if let Some(event) = &event {
            debug!("{:?}: {:?}", self.phase, event);
        }
        self.collect_summary();
        event
    }

    /// Per-frame tick of the current test
    pub fn update(&mut self) -> Vec<TestEvent> {
        let Some(test) = self.current_test() else {
            return Vec::new();
        };
        let events = test.update();
        self.collect_summary();
        events
    }

    /// The "start"/"next" action: leaves the welcome screen, starts an idle
    /// test, or moves on from a completed one. Entering the summary submits;
    /// advancing on the summary retries a failed submission.
    ///
    /// Returns true if anything changed.
    pub fn advance(&mut self) -> Result<bool, SubmitError> {
        match self.current_status() {
            Some(TestStatus::Idle) => {
                if let Some(test) = self.current_test() {
                    test.start();
                }
                Ok(true)
            }
            Some(TestStatus::Running) => Ok(false),
            Some(TestStatus::Completed) | None => {
                if self.phase.is_summary() && !self.submitted {
                    self.submit()?;
                    return Ok(true);
                }
                let Some(next) = self.phase.next() else {
                    return Ok(false);
                };
                info!("Advancing from {:?} to {:?}", self.phase, next);
                self.phase = next;
                if next.is_summary() {
                    self.submit()?;
                }
                Ok(true)
            }
        }
    }

    /// Submits the results; a failed submission can be retried
    pub fn submit(&mut self) -> Result<(), SubmitError> {
        if self.submitted {
            return Err(SubmitError::AlreadySubmitted);
        }
        if !self.results.is_complete() {
            warn!("Submitting incomplete results");
        }
        match self.sink.submit(&self.results) {
            Ok(()) => {
                self.submitted = true;
                self.submit_error = None;
                info!("Results submitted");
                Ok(())
            }
            Err(e) => {
                self.submit_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    fn collect_summary(&mut self) {
        let Some(kind) = self.phase.test_kind() else {
            return;
        };
        if self.results.has(kind) {
            return;
        }
        let summary = match kind {
            TestKind::Reaction => self.reaction.summary(),
            TestKind::Aim => self.aim.summary(),
            TestKind::Click => self.click.summary(),
        };
        if let Some(summary) = summary {
            if let Err(e) = self.results.record(summary) {
                warn!("{}", e);
            } else {
                info!("Recorded {} test results", kind);
            }
        }
    }
}
