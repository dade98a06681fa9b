//! Adaptive refinement along one control axis.
//!
//! Starting from a seed value the refiner keeps growing the control value
//! until two successive results agree, or a call ceiling is reached. It only
//! searches upward.

use serde::{Deserialize, Serialize};
use tfim_core::{ControlAxis, ControlParameter, ErrorInfo, ModelParameters, TfimError};
use tfim_solve::SolverAdapter;
use tracing::{debug, info, warn};

use crate::judge::{judge, Tolerance};
use crate::trace::{ConvergenceTrace, RunError};

/// Rule producing the next control value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Growth {
    /// `2v`.
    #[default]
    Double,
    /// `max(ceil(v * f), v + 1)` with `f > 1`.
    Factor(f64),
    /// `v + s` with `s >= 1`.
    Step(u32),
}

impl Growth {
    /// Rejects factors not above one and zero steps.
    pub fn validate(&self) -> Result<(), TfimError> {
        match *self {
            Growth::Double => Ok(()),
            Growth::Factor(factor) if factor.is_finite() && factor > 1.0 => Ok(()),
            Growth::Step(step) if step >= 1 => Ok(()),
            other => Err(TfimError::Validation(
                ErrorInfo::new("refine.growth", "growth must strictly increase the control value")
                    .with_context("growth", format!("{other:?}")),
            )),
        }
    }

    /// Next control value, or `None` when it does not fit in `u32`.
    pub fn next(&self, value: u32) -> Option<u32> {
        match *self {
            Growth::Double => value.checked_mul(2),
            Growth::Factor(factor) => {
                let scaled = (f64::from(value) * factor).ceil();
                let floor = value.checked_add(1)?;
                if scaled > f64::from(u32::MAX) {
                    return None;
                }
                Some((scaled as u32).max(floor))
            }
            Growth::Step(step) => value.checked_add(step),
        }
    }
}

/// Parameters of one refinement run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RefineSpec {
    /// Axis to refine.
    pub axis: ControlAxis,
    /// First control value.
    pub start: u32,
    /// Growth rule.
    #[serde(default)]
    pub growth: Growth,
    /// Convergence criterion between successive values.
    #[serde(default)]
    pub tolerance: Tolerance,
    /// Upper bound on solver calls, the first one included.
    #[serde(default = "RefineSpec::default_max_calls")]
    pub max_calls: u32,
}

impl RefineSpec {
    const fn default_max_calls() -> u32 {
        6
    }

    /// Refinement on `axis` from `start` with default growth, tolerance and
    /// ceiling.
    pub fn new(axis: ControlAxis, start: u32) -> Self {
        Self {
            axis,
            start,
            growth: Growth::default(),
            tolerance: Tolerance::default(),
            max_calls: Self::default_max_calls(),
        }
    }

    /// Validates every field.
    pub fn validate(&self) -> Result<(), TfimError> {
        if self.max_calls == 0 {
            return Err(TfimError::validation(
                "refine.max_calls",
                "max_calls must be at least 1",
            ));
        }
        ControlParameter::new(self.axis, self.start)?;
        self.growth.validate()?;
        self.tolerance.validate()
    }
}

/// Refines until two successive results agree within the tolerance.
pub fn refine<S: SolverAdapter + ?Sized>(
    solver: &S,
    model: &ModelParameters,
    spec: &RefineSpec,
) -> Result<ConvergenceTrace, RunError> {
    let start = spec
        .validate()
        .and_then(|()| ControlParameter::new(spec.axis, spec.start))
        .and_then(|control| solver.check(model, control).map(|()| control))
        .map_err(RunError::Rejected)?;

    let mut trace = ConvergenceTrace::new(spec.axis);
    let mut control = start;
    loop {
        let result = match solver.solve(model, control) {
            Ok(result) => result,
            Err(error) => {
                warn!(
                    solver = solver.name(),
                    %control,
                    completed = trace.len(),
                    code = %error.info().code,
                    "refinement interrupted"
                );
                trace.settle();
                return Err(RunError::Interrupted {
                    partial: trace,
                    error,
                });
            }
        };
        let judgement = judge(trace.last(), &result, &spec.tolerance);
        debug!(
            %control,
            energy_density = result.energy_density,
            delta = ?judgement.delta,
            "refinement step"
        );
        trace.push(result, judgement);
        if judgement.converged || trace.len() >= spec.max_calls as usize {
            break;
        }
        match next_control(solver, model, spec, control) {
            Some(next) => control = next,
            None => break,
        }
    }

    trace.settle();
    if trace.converged {
        info!(
            solver = solver.name(),
            axis = %spec.axis,
            calls = trace.len(),
            accepted = ?trace.accepted,
            "refinement converged"
        );
    } else {
        warn!(
            solver = solver.name(),
            axis = %spec.axis,
            calls = trace.len(),
            accepted = ?trace.accepted,
            "refinement stopped without convergence"
        );
    }
    Ok(trace)
}

/// Next control to try, or `None` when the axis is exhausted for this solver.
fn next_control<S: SolverAdapter + ?Sized>(
    solver: &S,
    model: &ModelParameters,
    spec: &RefineSpec,
    current: ControlParameter,
) -> Option<ControlParameter> {
    let value = spec.growth.next(current.value)?;
    let control = ControlParameter::new(spec.axis, value).ok()?;
    match solver.check(model, control) {
        Ok(()) => Some(control),
        Err(error) => {
            debug!(%control, code = %error.info().code, "solver cannot go further");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tfim_core::SolverResult;
    use tfim_solve::{CallCounter, ExactDiagonalization};

    struct Constant;

    impl SolverAdapter for Constant {
        fn name(&self) -> &str {
            "constant"
        }

        fn solve(
            &self,
            _model: &ModelParameters,
            control: ControlParameter,
        ) -> Result<SolverResult, TfimError> {
            SolverResult::new(control, -1.25)
        }
    }

    /// Energy moves by the control value itself, so it never settles.
    struct Diverging;

    impl SolverAdapter for Diverging {
        fn name(&self) -> &str {
            "diverging"
        }

        fn solve(
            &self,
            _model: &ModelParameters,
            control: ControlParameter,
        ) -> Result<SolverResult, TfimError> {
            SolverResult::new(control, f64::from(control.value))
        }
    }

    fn model() -> ModelParameters {
        ModelParameters::new(1.0, 0.5, 2).expect("model")
    }

    #[test]
    fn constant_solver_converges_in_two_calls() {
        let solver = CallCounter::new(Constant);
        let spec = RefineSpec::new(ControlAxis::BondDimension, 50);
        let trace = refine(&solver, &model(), &spec).expect("refine");
        assert_eq!(solver.count(), 2);
        assert!(trace.converged);
        assert_eq!(trace.accepted, Some(100));
    }

    #[test]
    fn diverging_solver_hits_the_ceiling() {
        let solver = CallCounter::new(Diverging);
        let spec = RefineSpec {
            growth: Growth::Step(10),
            max_calls: 4,
            ..RefineSpec::new(ControlAxis::BondDimension, 20)
        };
        let trace = refine(&solver, &model(), &spec).expect("refine");
        assert_eq!(solver.count(), 4);
        assert!(!trace.converged);
        assert_eq!(trace.control_values(), vec![20, 30, 40, 50]);
        assert_eq!(trace.accepted, Some(50));
    }

    #[test]
    fn overflow_ends_the_run_as_a_ceiling() {
        let spec = RefineSpec {
            max_calls: 10,
            ..RefineSpec::new(ControlAxis::BondDimension, u32::MAX / 2 + 1)
        };
        let trace = refine(&Diverging, &model(), &spec).expect("refine");
        assert_eq!(trace.len(), 1);
        assert!(!trace.converged);
    }

    #[test]
    fn ed_refinement_stops_at_the_chain_ceiling() {
        let solver = CallCounter::new(ExactDiagonalization::default());
        let spec = RefineSpec {
            growth: Growth::Step(4),
            tolerance: Tolerance::absolute(1e-12),
            max_calls: 10,
            ..RefineSpec::new(ControlAxis::UnitCellSize, 4)
        };
        let trace = refine(&solver, &model(), &spec).expect("refine");
        assert_eq!(solver.calls().len(), 3);
        assert_eq!(trace.control_values(), vec![4, 8, 12]);
    }

    #[test]
    fn invalid_specs_are_rejected_without_calls() {
        let solver = CallCounter::new(Constant);
        let base = RefineSpec::new(ControlAxis::BondDimension, 50);
        let bad = [
            RefineSpec { max_calls: 0, ..base },
            RefineSpec { start: 0, ..base },
            RefineSpec { growth: Growth::Factor(1.0), ..base },
            RefineSpec { growth: Growth::Step(0), ..base },
            RefineSpec { tolerance: Tolerance::absolute(0.0), ..base },
        ];
        for spec in &bad {
            let err = refine(&solver, &model(), spec).expect_err("rejected");
            assert!(matches!(err, RunError::Rejected(_)), "{spec:?}");
        }
        assert_eq!(solver.count(), 0);
    }

    #[test]
    fn factor_growth_always_advances() {
        assert_eq!(Growth::Factor(1.01).next(10), Some(11));
        assert_eq!(Growth::Factor(1.5).next(50), Some(75));
        assert_eq!(Growth::Double.next(u32::MAX), None);
    }

    proptest! {
        #[test]
        fn growth_is_strictly_increasing(
            value in 1u32..1_000_000,
            factor in 1.0001f64..8.0,
            step in 1u32..1000,
        ) {
            for growth in [Growth::Double, Growth::Factor(factor), Growth::Step(step)] {
                let next = growth.next(value).expect("fits");
                prop_assert!(next > value);
            }
        }
    }
}
