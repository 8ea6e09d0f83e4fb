use crate::phase::TestKind;
use crate::stats::{average, clicks_per_minute, std_dev};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ResultsError {
    #[error("{0} test results were already recorded")]
    AlreadyRecorded(TestKind),
}

/// Aim test sub-record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AimResults {
    pub hits: u32,
    pub misses: u32,
    /// Milliseconds from target spawn to hit, one per hit
    pub times_to_hit: Vec<u64>,
    /// Configured duration in seconds
    pub duration: u32,
}

/// Click speed test sub-record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClickResults {
    pub clicks: u32,
    pub duration: u32,
    pub errors: u32,
}

/// What a test hands over when it completes
#[derive(Debug, Clone, PartialEq)]
pub enum TestSummary {
    Aim {
        results: AimResults,
        test_duration_secs: f64,
    },
    Click {
        results: ClickResults,
        test_duration_secs: f64,
    },
    Reaction {
        reaction_times: Vec<u64>,
        false_starts: u32,
        test_duration_secs: f64,
    },
}

impl TestSummary {
    pub fn kind(&self) -> TestKind {
        match self {
            TestSummary::Aim { .. } => TestKind::Aim,
            TestSummary::Click { .. } => TestKind::Click,
            TestSummary::Reaction { .. } => TestKind::Reaction,
        }
    }
}

/// Per-session features computed from the raw results, the shape the
/// offline analysis consumes. A field is `None` when its test has no data.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DerivedMetrics {
    pub reaction_ms_mean: Option<f64>,
    pub reaction_ms_std: Option<f64>,
    pub false_starts: Option<u32>,
    /// Hits over all aim clicks
    pub aim_accuracy: Option<f64>,
    pub mean_time_to_hit_ms: Option<f64>,
    pub miss_rate: Option<f64>,
    pub cpm: Option<u32>,
    /// Errors over all clicks of the click test
    pub error_rate: Option<f64>,
    /// Sum of the measured test durations
    pub test_duration_s: Option<f64>,
}

fn ratio(part: u32, whole: u32) -> Option<f64> {
    (whole > 0).then(|| part as f64 / whole as f64)
}

/// Results shared by all tests of a session, filled once per test on completion
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestResults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aim_results: Option<AimResults>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aim_test_duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub click_test: Option<ClickResults>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub click_test_duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reaction_times: Option<Vec<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub false_starts: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reaction_test_duration: Option<f64>,
}

impl TestResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, kind: TestKind) -> bool {
        match kind {
            TestKind::Aim => self.aim_results.is_some(),
            TestKind::Click => self.click_test.is_some(),
            TestKind::Reaction => self.reaction_times.is_some(),
        }
    }

    pub fn is_complete(&self) -> bool {
        [TestKind::Reaction, TestKind::Aim, TestKind::Click]
            .iter()
            .all(|kind| self.has(*kind))
    }

    pub fn derived_metrics(&self) -> DerivedMetrics {
        let reaction = self.reaction_times.as_deref().unwrap_or_default();
        let aim = self.aim_results.as_ref();
        let aim_clicks = aim.map(|a| a.hits + a.misses).unwrap_or_default();
        let durations = [
            self.reaction_test_duration,
            self.aim_test_duration,
            self.click_test_duration,
        ];
        let test_duration_s = durations
            .iter()
            .flatten()
            .copied()
            .reduce(|a, b| a + b);

        DerivedMetrics {
            reaction_ms_mean: average(reaction),
            reaction_ms_std: std_dev(reaction),
            false_starts: self.false_starts,
            aim_accuracy: aim.and_then(|a| ratio(a.hits, aim_clicks)),
            mean_time_to_hit_ms: aim.and_then(|a| average(&a.times_to_hit)),
            miss_rate: aim.and_then(|a| ratio(a.misses, aim_clicks)),
            cpm: self
                .click_test
                .as_ref()
                .map(|c| clicks_per_minute(c.clicks, c.duration)),
            error_rate: self
                .click_test
                .as_ref()
                .and_then(|c| ratio(c.errors, c.clicks)),
            test_duration_s,
        }
    }

    /// Copies a completed test's summary in; each test may be recorded only once
    pub fn record(&mut self, summary: TestSummary) -> Result<(), ResultsError> {
        let kind = summary.kind();
        if self.has(kind) {
            return Err(ResultsError::AlreadyRecorded(kind));
        }
        match summary {
            TestSummary::Aim {
                results,
                test_duration_secs,
            } => {
                self.aim_results = Some(results);
                self.aim_test_duration = Some(test_duration_secs);
            }
            TestSummary::Click {
                results,
                test_duration_secs,
            } => {
                self.click_test = Some(results);
                self.click_test_duration = Some(test_duration_secs);
            }
            TestSummary::Reaction {
                reaction_times,
                false_starts,
                test_duration_secs,
            } => {
                self.reaction_times = Some(reaction_times);
                self.false_starts = Some(false_starts);
                self.reaction_test_duration = Some(test_duration_secs);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn click_summary(clicks: u32) -> TestSummary {
        TestSummary::Click {
            results: ClickResults {
                clicks,
                duration: 10,
                errors: 1,
            },
            test_duration_secs: 10.02,
        }
    }

    #[test]
    fn records_each_test_once() {
        let mut results = TestResults::new();
        assert!(!results.has(TestKind::Click));

        results.record(click_summary(42)).unwrap();
        assert!(results.has(TestKind::Click));
        assert_eq!(results.click_test.as_ref().map(|c| c.clicks), Some(42));

        let err = results.record(click_summary(99)).unwrap_err();
        assert_eq!(err, ResultsError::AlreadyRecorded(TestKind::Click));
        assert_eq!(results.click_test.as_ref().map(|c| c.clicks), Some(42));
    }

    #[test]
    fn complete_after_all_three() {
        let mut results = TestResults::new();
        results.record(click_summary(1)).unwrap();
        results
            .record(TestSummary::Reaction {
                reaction_times: vec![250, 270],
                false_starts: 0,
                test_duration_secs: 12.5,
            })
            .unwrap();
        assert!(!results.is_complete());
        results
            .record(TestSummary::Aim {
                results: AimResults {
                    hits: 3,
                    misses: 1,
                    times_to_hit: vec![400, 500, 450],
                    duration: 30,
                },
                test_duration_secs: 30.001,
            })
            .unwrap();
        assert!(results.is_complete());
    }

    #[test]
    fn derived_metrics_from_all_tests() {
        let mut results = TestResults::new();
        results
            .record(TestSummary::Reaction {
                reaction_times: vec![200, 300],
                false_starts: 1,
                test_duration_secs: 20.0,
            })
            .unwrap();
        results
            .record(TestSummary::Aim {
                results: AimResults {
                    hits: 3,
                    misses: 1,
                    times_to_hit: vec![400, 500, 600],
                    duration: 30,
                },
                test_duration_secs: 30.0,
            })
            .unwrap();
        results
            .record(TestSummary::Click {
                results: ClickResults {
                    clicks: 50,
                    duration: 10,
                    errors: 5,
                },
                test_duration_secs: 10.0,
            })
            .unwrap();

        let m = results.derived_metrics();
        assert_eq!(m.reaction_ms_mean, Some(250.0));
        assert_eq!(m.reaction_ms_std, Some(50.0));
        assert_eq!(m.false_starts, Some(1));
        assert_eq!(m.aim_accuracy, Some(0.75));
        assert_eq!(m.miss_rate, Some(0.25));
        assert_eq!(m.mean_time_to_hit_ms, Some(500.0));
        assert_eq!(m.cpm, Some(300));
        assert_eq!(m.error_rate, Some(0.1));
        assert_eq!(m.test_duration_s, Some(60.0));
    }

    #[test]
    fn derived_metrics_without_data() {
        assert_eq!(TestResults::new().derived_metrics(), DerivedMetrics::default());

        let mut results = TestResults::new();
        results
            .record(TestSummary::Click {
                results: ClickResults {
                    clicks: 0,
                    duration: 10,
                    errors: 0,
                },
                test_duration_secs: 10.0,
            })
            .unwrap();
        let m = results.derived_metrics();
        assert_eq!(m.cpm, Some(0));
        assert_eq!(m.error_rate, None);
        assert_eq!(m.aim_accuracy, None);
        assert_eq!(m.test_duration_s, Some(10.0));
    }

    #[test]
    fn serializes_with_submission_field_names() {
        let mut results = TestResults::new();
        results
            .record(TestSummary::Reaction {
                reaction_times: vec![310],
                false_starts: 2,
                test_duration_secs: 9.5,
            })
            .unwrap();

        let json = serde_json::to_value(&results).unwrap();
        assert_eq!(json["reaction_times"], serde_json::json!([310]));
        assert_eq!(json["false_starts"], 2);
        assert_eq!(json["reaction_test_duration"], 9.5);
        assert!(json.get("aim_results").is_none());
    }
}
