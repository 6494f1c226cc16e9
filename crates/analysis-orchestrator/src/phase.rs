use std::fmt;

use statement_core::AnalysisError;
use tracing::{info, warn};

/// Lifecycle of a single engine run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Requested,
    Validating,
    Computing,
    Classifying,
    Aggregating,
    Completed,
    Failed,
}

impl RunPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunPhase::Requested => "requested",
            RunPhase::Validating => "validating",
            RunPhase::Computing => "computing",
            RunPhase::Classifying => "classifying",
            RunPhase::Aggregating => "aggregating",
            RunPhase::Completed => "completed",
            RunPhase::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunPhase::Completed | RunPhase::Failed)
    }

    fn next(&self) -> Option<RunPhase> {
        match self {
            RunPhase::Requested => Some(RunPhase::Validating),
            RunPhase::Validating => Some(RunPhase::Computing),
            RunPhase::Computing => Some(RunPhase::Classifying),
            RunPhase::Classifying => Some(RunPhase::Aggregating),
            RunPhase::Aggregating => Some(RunPhase::Completed),
            RunPhase::Completed | RunPhase::Failed => None,
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Enforces the forward-only phase order and logs every transition.
#[derive(Debug)]
pub struct RunTracker {
    phase: RunPhase,
    history: Vec<RunPhase>,
}

impl Default for RunTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl RunTracker {
    pub fn new() -> Self {
        Self {
            phase: RunPhase::Requested,
            history: vec![RunPhase::Requested],
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn history(&self) -> &[RunPhase] {
        &self.history
    }

    /// Move to the next phase in order. Skipping or going back is a bug.
    pub fn advance(&mut self, to: RunPhase) -> Result<(), AnalysisError> {
        if self.phase.next() != Some(to) {
            return Err(AnalysisError::Internal(format!(
                "illegal run transition {} -> {}",
                self.phase, to
            )));
        }
        info!(from = %self.phase, to = %to, "Run phase transition");
        self.phase = to;
        self.history.push(to);
        Ok(())
    }

    /// Any non-terminal phase may fail.
    pub fn fail(&mut self, reason: &str) {
        if self.phase.is_terminal() {
            return;
        }
        warn!(from = %self.phase, reason, "Run failed");
        self.phase = RunPhase::Failed;
        self.history.push(RunPhase::Failed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut tracker = RunTracker::new();
        for phase in [
            RunPhase::Validating,
            RunPhase::Computing,
            RunPhase::Classifying,
            RunPhase::Aggregating,
            RunPhase::Completed,
        ] {
            tracker.advance(phase).unwrap();
        }
        assert_eq!(tracker.phase(), RunPhase::Completed);
        assert_eq!(tracker.history().len(), 6);
    }

    #[test]
    fn test_skipping_is_rejected() {
        let mut tracker = RunTracker::new();
        assert!(tracker.advance(RunPhase::Computing).is_err());
        assert_eq!(tracker.phase(), RunPhase::Requested);
    }

    #[test]
    fn test_fail_from_any_open_phase() {
        let mut tracker = RunTracker::new();
        tracker.advance(RunPhase::Validating).unwrap();
        tracker.fail("bad input");
        assert_eq!(tracker.phase(), RunPhase::Failed);
        assert!(tracker.advance(RunPhase::Computing).is_err());

        tracker.fail("again");
        assert_eq!(tracker.history().last(), Some(&RunPhase::Failed));
        assert_eq!(tracker.history().len(), 3);
    }
}
