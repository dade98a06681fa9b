use serde::{Deserialize, Serialize};
use tfim_core::{ErrorInfo, SolverResult, TfimError};

/// How the difference between two successive energies is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeltaRule {
    /// `|current - previous|`.
    #[default]
    Absolute,
    /// `|current - previous| / |previous|`, falling back to the absolute
    /// difference when `previous` is zero.
    Relative,
}

/// Convergence criterion: a pair is converged when its delta is strictly
/// below `threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    /// Strictly positive threshold.
    pub threshold: f64,
    /// Delta measure.
    #[serde(default)]
    pub rule: DeltaRule,
}

impl Tolerance {
    /// Absolute-difference criterion.
    pub const fn absolute(threshold: f64) -> Self {
        Self {
            threshold,
            rule: DeltaRule::Absolute,
        }
    }

    /// Relative-difference criterion (`0.01` is a 1% change).
    pub const fn relative(threshold: f64) -> Self {
        Self {
            threshold,
            rule: DeltaRule::Relative,
        }
    }

    /// Rejects non-positive or non-finite thresholds.
    pub fn validate(&self) -> Result<(), TfimError> {
        if !(self.threshold.is_finite() && self.threshold > 0.0) {
            return Err(TfimError::Validation(
                ErrorInfo::new("tolerance.threshold", "threshold must be finite and positive")
                    .with_context("threshold", self.threshold.to_string()),
            ));
        }
        Ok(())
    }

    /// Delta between two energies under this rule.
    pub fn delta(&self, previous: f64, current: f64) -> f64 {
        let diff = (current - previous).abs();
        match self.rule {
            DeltaRule::Absolute => diff,
            DeltaRule::Relative if previous == 0.0 => diff,
            DeltaRule::Relative => diff / previous.abs(),
        }
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::absolute(1e-5)
    }
}

/// Verdict on one step of a trace.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Judgement {
    /// Whether the step is within tolerance of its predecessor.
    pub converged: bool,
    /// Delta to the predecessor; `None` for a baseline point.
    pub delta: Option<f64>,
}

impl Judgement {
    /// Verdict for a point with nothing to compare against.
    pub const fn baseline() -> Self {
        Self {
            converged: false,
            delta: None,
        }
    }
}

/// Judges `current` against `previous`.
///
/// Without a previous result the point is a baseline and never converged.
/// A NaN delta never counts as converged.
pub fn judge(
    previous: Option<&SolverResult>,
    current: &SolverResult,
    tolerance: &Tolerance,
) -> Judgement {
    match previous {
        None => Judgement::baseline(),
        Some(previous) => {
            let delta = tolerance.delta(previous.energy_density, current.energy_density);
            Judgement {
                converged: delta < tolerance.threshold,
                delta: Some(delta),
            }
        }
    }
}

/// Judges the last two entries of a sequence.
pub fn judge_sequence(results: &[SolverResult], tolerance: &Tolerance) -> Judgement {
    match results {
        [.., previous, current] => judge(Some(previous), current, tolerance),
        _ => Judgement::baseline(),
    }
}
