use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tfim_conv::{refine, sweep, Growth, RefineSpec, Tolerance};
use tfim_core::{ControlAxis, ControlParameter, ModelParameters, SolverResult, TfimError};
use tfim_solve::SolverAdapter;

/// Cheap synthetic solver with a power-law approach to its limit.
struct PowerLaw;

impl SolverAdapter for PowerLaw {
    fn name(&self) -> &str {
        "power-law"
    }

    fn solve(
        &self,
        model: &ModelParameters,
        control: ControlParameter,
    ) -> Result<SolverResult, TfimError> {
        let value = f64::from(control.value);
        SolverResult::new(control, -model.coupling_j() - 1.0 / (value * value))
            .map(|result| result.with_observable("entropy", value.ln()))
    }
}

fn bench_sweep(c: &mut Criterion) {
    let model = ModelParameters::new(1.0, 0.5, 2).expect("model");
    let values: Vec<u32> = (1..=256).collect();
    let tolerance = Tolerance::relative(0.01);
    c.bench_function("sweep_256_values", |b| {
        b.iter(|| {
            let trace = sweep(&PowerLaw, &model, ControlAxis::BondDimension, &values, &tolerance)
                .expect("sweep");
            black_box(trace.accepted);
        });
    });
}

fn bench_refine(c: &mut Criterion) {
    let model = ModelParameters::new(1.0, 0.5, 2).expect("model");
    let spec = RefineSpec {
        growth: Growth::Step(1),
        tolerance: Tolerance::absolute(1e-9),
        max_calls: 512,
        ..RefineSpec::new(ControlAxis::BondDimension, 1)
    };
    c.bench_function("refine_step_growth", |b| {
        b.iter(|| {
            let trace = refine(&PowerLaw, &model, &spec).expect("refine");
            black_box(trace.len());
        });
    });
}

criterion_group!(benches, bench_sweep, bench_refine);
criterion_main!(benches);
