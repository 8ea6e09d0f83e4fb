pub mod phase;
pub mod results;
pub mod stats;

pub use phase::{SessionPhase, TestKind, TestStatus};
pub use results::{
    AimResults, ClickResults, DerivedMetrics, ResultsError, TestResults, TestSummary,
};
pub use stats::{average, clicks_per_minute, std_dev};
