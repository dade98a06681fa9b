use serde::{Deserialize, Serialize};
use thiserror::Error;
use tfim_core::{ControlAxis, SolverResult, TfimError};

use crate::judge::Judgement;

/// One solver call and its verdict against the preceding call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceStep {
    /// Result of the call.
    pub result: SolverResult,
    /// Verdict against the previous step.
    pub judgement: Judgement,
}

/// Ordered record of a sweep or refinement run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceTrace {
    /// Axis the run moved along.
    pub axis: ControlAxis,
    /// Steps in call order.
    pub steps: Vec<TraceStep>,
    /// Whether some consecutive pair met the tolerance.
    pub converged: bool,
    /// Accepted control value; `None` only for an empty trace.
    pub accepted: Option<u32>,
}

impl ConvergenceTrace {
    /// Empty trace on `axis`.
    pub fn new(axis: ControlAxis) -> Self {
        Self {
            axis,
            steps: Vec::new(),
            converged: false,
            accepted: None,
        }
    }

    pub(crate) fn push(&mut self, result: SolverResult, judgement: Judgement) {
        self.steps.push(TraceStep { result, judgement });
    }

    /// Settles the verdict: the finer value of the first converged pair, or
    /// the last value attempted.
    pub(crate) fn settle(&mut self) {
        let first = self
            .steps
            .iter()
            .find(|step| step.judgement.converged)
            .or_else(|| self.steps.last());
        self.converged = self.steps.iter().any(|step| step.judgement.converged);
        self.accepted = first.map(|step| step.result.control.value);
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// True when no call completed.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Control values in call order.
    pub fn control_values(&self) -> Vec<u32> {
        self.steps.iter().map(|step| step.result.control.value).collect()
    }

    /// Energy densities in call order.
    pub fn energy_densities(&self) -> Vec<f64> {
        self.steps.iter().map(|step| step.result.energy_density).collect()
    }

    /// Most recent result.
    pub fn last(&self) -> Option<&SolverResult> {
        self.steps.last().map(|step| &step.result)
    }

    /// Result at the accepted value.
    ///
    /// Duplicated control values resolve to the step the verdict was drawn
    /// from.
    pub fn accepted_result(&self) -> Option<&SolverResult> {
        let accepted = self.accepted?;
        if self.converged {
            self.steps
                .iter()
                .find(|step| step.judgement.converged)
                .map(|step| &step.result)
        } else {
            self.steps
                .iter()
                .rev()
                .find(|step| step.result.control.value == accepted)
                .map(|step| &step.result)
        }
    }
}

/// Failure of a sweep or refinement.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RunError {
    /// Input rejected before the first solver call.
    #[error("run rejected: {0}")]
    Rejected(TfimError),
    /// A solver call failed; every result before it is kept.
    #[error("run interrupted after {} step(s): {error}", partial.len())]
    Interrupted {
        /// Steps completed before the failing call.
        partial: ConvergenceTrace,
        /// Error of the failing call.
        error: TfimError,
    },
}

impl RunError {
    /// Underlying toolkit error.
    pub fn error(&self) -> &TfimError {
        match self {
            RunError::Rejected(error) | RunError::Interrupted { error, .. } => error,
        }
    }

    /// Partial trace, when calls were issued.
    pub fn partial(&self) -> Option<&ConvergenceTrace> {
        match self {
            RunError::Rejected(_) => None,
            RunError::Interrupted { partial, .. } => Some(partial),
        }
    }

    /// Splits into the partial trace and the error.
    pub fn into_parts(self) -> (Option<ConvergenceTrace>, TfimError) {
        match self {
            RunError::Rejected(error) => (None, error),
            RunError::Interrupted { partial, error } => (Some(partial), error),
        }
    }
}

impl From<RunError> for TfimError {
    fn from(err: RunError) -> Self {
        err.into_parts().1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tfim_core::ControlParameter;

    fn step(value: u32, energy: f64, converged: bool) -> (SolverResult, Judgement) {
        let result = SolverResult::new(ControlParameter::unit_cell(value).expect("control"), energy)
            .expect("result");
        let judgement = Judgement {
            converged,
            delta: Some(0.0),
        };
        (result, judgement)
    }

    #[test]
    fn settle_prefers_first_converged_pair() {
        let mut trace = ConvergenceTrace::new(ControlAxis::UnitCellSize);
        for (value, converged) in [(2, false), (4, true), (6, false), (8, true)] {
            let (result, judgement) = step(value, -1.0, converged);
            trace.push(result, judgement);
        }
        trace.settle();
        assert!(trace.converged);
        assert_eq!(trace.accepted, Some(4));
        assert_eq!(trace.accepted_result().map(|r| r.control.value), Some(4));
    }

    #[test]
    fn settle_without_convergence_takes_last_value() {
        let mut trace = ConvergenceTrace::new(ControlAxis::UnitCellSize);
        assert!(trace.accepted_result().is_none());
        for value in [2, 4] {
            let (result, judgement) = step(value, -1.0, false);
            trace.push(result, judgement);
        }
        trace.settle();
        assert!(!trace.converged);
        assert_eq!(trace.accepted, Some(4));
    }
}
