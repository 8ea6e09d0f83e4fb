pub mod aim;
pub mod click;
pub mod config;
pub mod countdown;
pub mod error;
pub mod reaction;
pub mod session;
pub mod sink;

pub use aim::{AimTest, Marker, Target};
pub use click::ClickTest;
pub use config::{AimConfig, ClickConfig, GamesConfig, ReactionConfig};
pub use error::{ConfigError, SubmitError};
pub use reaction::{ReactionTest, Signal};
pub use session::Session;
pub use sink::{JsonFileSink, MemorySink, ResultsSink};

use reflex_core::{TestKind, TestStatus, TestSummary};

/// Things that happened inside a test, reported to the session and the log
#[derive(Debug, Clone, PartialEq)]
pub enum TestEvent {
    Started,
    Tick { time_left: u32 },
    TargetSpawned { position: (f32, f32) },
    TargetExpired,
    Hit { latency_ms: u64 },
    Miss { position: (f32, f32) },
    Click { error: bool },
    RoundStarted,
    SignalShown,
    FalseStart { total: u32 },
    Reaction { latency_ms: u64 },
    Completed,
}

/// A timed skill test driven by clicks and per-frame updates
pub trait SkillTest {
    fn kind(&self) -> TestKind;
    fn status(&self) -> TestStatus;

    /// Resets the state record and begins running
    fn start(&mut self);

    /// A click at `pos` in test-area coordinates. Clicking an idle test starts it.
    fn handle_click(&mut self, pos: (f32, f32)) -> Option<TestEvent>;

    /// Fires every deadline that has passed since the last update
    fn update(&mut self) -> Vec<TestEvent>;

    /// The summary to record, once completed
    fn summary(&self) -> Option<TestSummary>;
}
