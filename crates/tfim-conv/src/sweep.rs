//! Fixed-list sweeps.
//!
//! Every value in the list is solved, in order, even after convergence has
//! been observed. The verdict is drawn once the list is exhausted.

use tfim_core::{ControlAxis, ControlParameter, ErrorInfo, ModelParameters, TfimError};
use tfim_solve::SolverAdapter;
use tracing::{debug, info, warn};

use crate::judge::{judge, Tolerance};
use crate::trace::{ConvergenceTrace, RunError};

/// Sweeps `values` along `axis`, judging every call against the previous one.
pub fn sweep<S: SolverAdapter + ?Sized>(
    solver: &S,
    model: &ModelParameters,
    axis: ControlAxis,
    values: &[u32],
    tolerance: &Tolerance,
) -> Result<ConvergenceTrace, RunError> {
    let controls = plan(solver, model, axis, values, tolerance).map_err(RunError::Rejected)?;

    let mut trace = ConvergenceTrace::new(axis);
    for control in controls {
        let result = match solver.solve(model, control) {
            Ok(result) => result,
            Err(error) => {
                warn!(
                    solver = solver.name(),
                    %control,
                    completed = trace.len(),
                    code = %error.info().code,
                    "sweep interrupted"
                );
                trace.settle();
                return Err(RunError::Interrupted {
                    partial: trace,
                    error,
                });
            }
        };
        let judgement = judge(trace.last(), &result, tolerance);
        debug!(
            %control,
            energy_density = result.energy_density,
            delta = ?judgement.delta,
            converged = judgement.converged,
            "sweep step"
        );
        trace.push(result, judgement);
    }

    trace.settle();
    info!(
        solver = solver.name(),
        axis = %axis,
        steps = trace.len(),
        converged = trace.converged,
        accepted = ?trace.accepted,
        "sweep finished"
    );
    Ok(trace)
}

fn plan<S: SolverAdapter + ?Sized>(
    solver: &S,
    model: &ModelParameters,
    axis: ControlAxis,
    values: &[u32],
    tolerance: &Tolerance,
) -> Result<Vec<ControlParameter>, TfimError> {
    if values.is_empty() {
        return Err(TfimError::Validation(
            ErrorInfo::new("sweep.empty", "sweep needs at least one control value")
                .with_context("axis", axis.label()),
        ));
    }
    tolerance.validate()?;
    let controls = values
        .iter()
        .map(|&value| ControlParameter::new(axis, value))
        .collect::<Result<Vec<_>, _>>()?;
    for control in &controls {
        solver.check(model, *control)?;
    }
    Ok(controls)
}
