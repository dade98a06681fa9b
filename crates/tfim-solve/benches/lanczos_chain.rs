use criterion::{criterion_group, criterion_main, Criterion};
use tfim_core::{ControlParameter, ModelParameters};
use tfim_solve::{ExactDiagonalization, SolverAdapter};

fn bench_chain(c: &mut Criterion) {
    let adapter = ExactDiagonalization::default();
    let model = ModelParameters::new(1.0, 0.9, 10).expect("model");
    let control = ControlParameter::unit_cell(10).expect("control");
    c.bench_function("lanczos_chain_l10", |b| {
        b.iter(|| adapter.solve(&model, control).expect("solve"))
    });
}

criterion_group!(benches, bench_chain);
criterion_main!(benches);
