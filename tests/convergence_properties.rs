use proptest::prelude::*;
use tfim_conv::{
    judge, judge_sequence, refine, sweep, Growth, RefineSpec, RunError, Tolerance,
};
use tfim_core::{ControlAxis, ControlParameter, ErrorInfo, ModelParameters, SolverResult, TfimError};
use tfim_solve::{CallCounter, ExactDiagonalization, SolverAdapter};

/// Energy given by a closure of the control value, failing on one scripted
/// value.
struct Scripted<F> {
    energy: F,
    fail_at: Option<u32>,
}

impl<F: Fn(u32) -> f64 + Send + Sync> SolverAdapter for Scripted<F> {
    fn name(&self) -> &str {
        "scripted"
    }

    fn solve(
        &self,
        _model: &ModelParameters,
        control: ControlParameter,
    ) -> Result<SolverResult, TfimError> {
        if self.fail_at == Some(control.value) {
            return Err(TfimError::Solver(ErrorInfo::new("scripted.fail", "scripted failure")));
        }
        SolverResult::new(control, (self.energy)(control.value))
    }
}

fn model() -> ModelParameters {
    ModelParameters::new(1.0, 0.5, 2).expect("model")
}

fn result(value: u32, energy: f64) -> SolverResult {
    SolverResult::new(ControlParameter::bond_dimension(value).expect("control"), energy)
        .expect("result")
}

#[test]
fn exact_diagonalization_is_finite_up_to_twelve_sites() {
    let solver = ExactDiagonalization::default();
    for length in 2..=12 {
        for field in [0.3, 1.0, 2.5] {
            let model = ModelParameters::new(1.0, field, length).expect("model");
            let control = ControlParameter::unit_cell(length).expect("control");
            let out = solver.solve(&model, control).expect("solve");
            assert!(out.energy_density.is_finite(), "L={length} h={field}");
        }
    }
}

#[test]
fn thirteen_sites_are_rejected_before_any_call() {
    let solver = CallCounter::new(ExactDiagonalization::default());
    let err = sweep(
        &solver,
        &model(),
        ControlAxis::UnitCellSize,
        &[4, 13],
        &Tolerance::default(),
    )
    .expect_err("too long");
    assert!(matches!(err, RunError::Rejected(_)));
    assert!(err.error().is_validation());
    assert_eq!(solver.count(), 0);
}

#[test]
fn singleton_sequence_is_not_converged() {
    let verdict = judge_sequence(&[result(50, -1.2)], &Tolerance::absolute(1.0));
    assert!(!verdict.converged);
    assert_eq!(verdict.delta, None);
}

#[test]
fn sweep_returns_controls_in_request_order() {
    let solver = CallCounter::new(ExactDiagonalization::default());
    let trace = sweep(
        &solver,
        &model(),
        ControlAxis::UnitCellSize,
        &[2, 4, 6, 8],
        &Tolerance::absolute(1e-5),
    )
    .expect("sweep");
    assert_eq!(trace.control_values(), vec![2, 4, 6, 8]);
    let issued: Vec<u32> = solver.calls().iter().map(|c| c.value).collect();
    assert_eq!(issued, vec![2, 4, 6, 8]);
}

#[test]
fn refiner_on_a_constant_solver_stops_after_two_calls() {
    let solver = CallCounter::new(Scripted {
        energy: |_| -1.25,
        fail_at: None,
    });
    let trace = refine(&solver, &model(), &RefineSpec::new(ControlAxis::BondDimension, 32))
        .expect("refine");
    assert!(trace.converged);
    assert_eq!(solver.count(), 2);
    assert_eq!(trace.accepted, Some(64));
}

#[test]
fn refiner_on_a_diverging_solver_stops_at_the_call_ceiling() {
    let solver = CallCounter::new(Scripted {
        energy: |value| f64::from(value),
        fail_at: None,
    });
    let spec = RefineSpec {
        growth: Growth::Step(10),
        max_calls: 4,
        ..RefineSpec::new(ControlAxis::BondDimension, 10)
    };
    let trace = refine(&solver, &model(), &spec).expect("refine");
    assert!(!trace.converged);
    assert_eq!(solver.count(), 4);
    assert_eq!(trace.control_values(), vec![10, 20, 30, 40]);
    assert_eq!(trace.accepted, Some(40));
}

proptest! {
    #[test]
    fn identical_results_always_converge(
        energy in -10.0f64..10.0,
        threshold in 1e-12f64..1.0,
        relative in any::<bool>(),
    ) {
        let tolerance = if relative {
            Tolerance::relative(threshold)
        } else {
            Tolerance::absolute(threshold)
        };
        let r = result(100, energy);
        prop_assert!(judge(Some(&r), &r, &tolerance).converged);
    }

    #[test]
    fn failing_call_keeps_every_earlier_result(k in 1usize..=5) {
        let values = [10u32, 20, 30, 40, 50];
        let solver = CallCounter::new(Scripted {
            energy: |value| -1.0 - 1.0 / f64::from(value),
            fail_at: Some(values[k - 1]),
        });
        let err = sweep(
            &solver,
            &model(),
            ControlAxis::BondDimension,
            &values,
            &Tolerance::absolute(1e-9),
        )
        .expect_err("scripted failure");
        let partial = err.partial().expect("partial trace");
        prop_assert_eq!(partial.control_values(), values[..k - 1].to_vec());
        prop_assert_eq!(solver.count(), k);
        prop_assert_eq!(err.error().family(), "Solver");
    }
}
