use tracing::{debug, warn};

use crate::types::SubmitOutcome;

const SAVE_LABEL: &str = "Save Changes";
const SAVING_LABEL: &str = "Saving...";

/// Submission phase of one form instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitPhase {
    /// Ready to accept a submit.
    Idle,
    /// A request is outstanding; further submits are dropped.
    Sending,
}

/// In-flight guard: at most one outstanding submit per form.
#[derive(Debug, Clone)]
pub struct SubmitGate {
    phase: SubmitPhase,
    last_outcome: Option<SubmitOutcome>,
}

impl Default for SubmitGate {
    fn default() -> Self {
        Self {
            phase: SubmitPhase::Idle,
            last_outcome: None,
        }
    }
}

impl SubmitGate {
    pub fn phase(&self) -> SubmitPhase {
        self.phase
    }

    pub fn is_sending(&self) -> bool {
        self.phase == SubmitPhase::Sending
    }

    /// Outcome of the most recent finished attempt.
    pub fn last_outcome(&self) -> Option<&SubmitOutcome> {
        self.last_outcome.as_ref()
    }

    /// Try to enter `Sending`. Returns `false` if a submit is already in flight.
    pub fn begin(&mut self) -> bool {
        if self.is_sending() {
            debug!("submit dropped: request already in flight");
            return false;
        }
        self.phase = SubmitPhase::Sending;
        true
    }

    /// Return to `Idle` and record how the attempt ended.
    pub fn finish(&mut self, outcome: SubmitOutcome) {
        if !self.is_sending() {
            warn!(?outcome, "submit finished while gate was idle");
        }
        self.phase = SubmitPhase::Idle;
        self.last_outcome = Some(outcome);
    }

    /// Label for the save action.
    pub fn status_label(&self) -> &'static str {
        match self.phase {
            SubmitPhase::Idle => SAVE_LABEL,
            SubmitPhase::Sending => SAVING_LABEL,
        }
    }
}
