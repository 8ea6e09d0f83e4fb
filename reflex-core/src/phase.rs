use serde::{Deserialize, Serialize};
use std::fmt;

/// The three skill tests, in the order a session runs them
#[derive(Copy, Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    Reaction,
    Aim,
    Click,
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TestKind::Reaction => "reaction",
            TestKind::Aim => "aim",
            TestKind::Click => "click",
        };
        f.write_str(name)
    }
}

/// Lifecycle shared by every test
#[derive(Copy, Debug, Clone, PartialEq, Eq, Default)]
pub enum TestStatus {
    #[default]
    Idle,
    Running,
    Completed,
}

impl TestStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, TestStatus::Running)
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, TestStatus::Completed)
    }
}

/// Screens of a session
#[derive(Copy, Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Welcome,
    Reaction,
    Aim,
    Click,
    Summary,
}

impl SessionPhase {
    pub fn next(&self) -> Option<Self> {
        use SessionPhase::*;
        Some(match self {
            Welcome => Reaction,
            Reaction => Aim,
            Aim => Click,
            Click => Summary,
            Summary => return None,
        })
    }

    /// The test played on this screen, if any
    pub fn test_kind(&self) -> Option<TestKind> {
        match self {
            SessionPhase::Reaction => Some(TestKind::Reaction),
            SessionPhase::Aim => Some(TestKind::Aim),
            SessionPhase::Click => Some(TestKind::Click),
            SessionPhase::Welcome | SessionPhase::Summary => None,
        }
    }

    pub fn is_welcome(&self) -> bool {
        matches!(self, SessionPhase::Welcome)
    }

    pub fn is_summary(&self) -> bool {
        matches!(self, SessionPhase::Summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_run_reaction_aim_click_then_summary() {
        let mut phase = SessionPhase::default();
        let mut seen = vec![phase];
        while let Some(next) = phase.next() {
            seen.push(next);
            phase = next;
        }
        assert_eq!(
            seen,
            vec![
                SessionPhase::Welcome,
                SessionPhase::Reaction,
                SessionPhase::Aim,
                SessionPhase::Click,
                SessionPhase::Summary,
            ]
        );
    }

    #[test]
    fn only_test_screens_have_a_kind() {
        assert_eq!(SessionPhase::Welcome.test_kind(), None);
        assert_eq!(SessionPhase::Aim.test_kind(), Some(TestKind::Aim));
        assert_eq!(SessionPhase::Summary.test_kind(), None);
    }
}
