//! Finite-size scaling of exact diagonalization against an infinite-chain
//! solve.

use serde::{Deserialize, Serialize};
use tfim_core::{ControlAxis, ControlParameter, ModelParameters, TfimError};
use tfim_solve::{thermodynamic_energy_density, SolverAdapter};
use tracing::{info, warn};

use crate::judge::Tolerance;
use crate::plot::{PlotSeries, PlotSink};
use crate::sweep::sweep;
use crate::trace::RunError;

/// Number of largest chains entering the `1/L` extrapolation.
pub const FIT_POINTS: usize = 3;

/// Inputs of a finite/infinite comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSpec {
    /// Periodic chain lengths for exact diagonalization.
    pub chain_lengths: Vec<u32>,
    /// Bond dimension of the single infinite-chain solve.
    pub bond_dimension: u32,
}

/// Outcome of a finite/infinite comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    /// Ising coupling.
    pub coupling_j: f64,
    /// Transverse field.
    pub transverse_field: f64,
    /// Chain lengths solved exactly.
    pub chain_lengths: Vec<u32>,
    /// Energy per site for each chain.
    pub ed_energies: Vec<f64>,
    /// Intercept `a` of `e(L) = a + b/L`.
    pub extrapolated_energy: f64,
    /// Slope `b` of the same fit.
    pub finite_size_slope: f64,
    /// Unit cell of the infinite solve.
    pub unit_cell_length: u32,
    /// Bond dimension of the infinite solve.
    pub bond_dimension: u32,
    /// Energy per site of the infinite solve.
    pub idmrg_energy: f64,
    /// `extrapolated_energy - idmrg_energy`.
    pub difference: f64,
    /// Free-fermion energy per site of the infinite chain.
    pub exact_energy: f64,
}

/// Least-squares line through `points`; a single point gives a flat line.
pub fn linear_fit(points: &[(f64, f64)]) -> Option<(f64, f64)> {
    match points {
        [] => None,
        [(_, y)] => Some((*y, 0.0)),
        _ => {
            let n = points.len() as f64;
            let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
            let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;
            let sxx: f64 = points.iter().map(|p| (p.0 - mean_x).powi(2)).sum();
            let sxy: f64 = points
                .iter()
                .map(|p| (p.0 - mean_x) * (p.1 - mean_y))
                .sum();
            if sxx <= f64::EPSILON * n {
                return Some((mean_y, 0.0));
            }
            let slope = sxy / sxx;
            Some((mean_y - slope * mean_x, slope))
        }
    }
}

/// Runs exact diagonalization over the chain lengths, then one infinite
/// solve, and extrapolates the finite energies in `1/L`.
///
/// Every chain length is checked against the exact solver before the first
/// call. `model` supplies the couplings and the unit cell of the infinite
/// solve.
pub fn compare_finite_infinite<E, I>(
    ed: &E,
    idmrg: &I,
    model: &ModelParameters,
    spec: &ComparisonSpec,
) -> Result<ComparisonReport, RunError>
where
    E: SolverAdapter + ?Sized,
    I: SolverAdapter + ?Sized,
{
    let chi = ControlParameter::bond_dimension(spec.bond_dimension)
        .and_then(|control| idmrg.check(model, control).map(|()| control))
        .map_err(RunError::Rejected)?;
    let trace = sweep(
        ed,
        model,
        ControlAxis::UnitCellSize,
        &spec.chain_lengths,
        &Tolerance::default(),
    )?;

    let infinite = match idmrg.solve(model, chi) {
        Ok(result) => result,
        Err(error) => {
            warn!(code = %error.info().code, "infinite solve failed after exact sweep");
            return Err(RunError::Interrupted {
                partial: trace,
                error,
            });
        }
    };

    let chain_lengths = trace.control_values();
    let ed_energies = trace.energy_densities();
    let tail: Vec<(f64, f64)> = chain_lengths
        .iter()
        .zip(&ed_energies)
        .skip(chain_lengths.len().saturating_sub(FIT_POINTS))
        .map(|(&length, &energy)| (1.0 / f64::from(length), energy))
        .collect();
    let (extrapolated_energy, finite_size_slope) = linear_fit(&tail).ok_or_else(|| {
        RunError::Rejected(TfimError::validation(
            "compare.no_points",
            "no chain lengths to extrapolate",
        ))
    })?;

    let report = ComparisonReport {
        coupling_j: model.coupling_j(),
        transverse_field: model.transverse_field(),
        chain_lengths,
        ed_energies,
        extrapolated_energy,
        finite_size_slope,
        unit_cell_length: model.length(),
        bond_dimension: spec.bond_dimension,
        idmrg_energy: infinite.energy_density,
        difference: extrapolated_energy - infinite.energy_density,
        exact_energy: thermodynamic_energy_density(model.coupling_j(), model.transverse_field()),
    };
    info!(
        extrapolated = report.extrapolated_energy,
        idmrg = report.idmrg_energy,
        exact = report.exact_energy,
        "finite/infinite comparison finished"
    );
    Ok(report)
}

/// Plots the exact energies against `1/L` together with the infinite-chain
/// value at `1/L = 0`.
pub fn plot_comparison(report: &ComparisonReport, sink: &dyn PlotSink) -> Result<String, TfimError> {
    let mut points: Vec<(f64, f64)> = report
        .chain_lengths
        .iter()
        .zip(&report.ed_energies)
        .map(|(&length, &energy)| (1.0 / f64::from(length), energy))
        .collect();
    points.push((0.0, report.idmrg_energy));
    points.sort_by(|a, b| a.0.total_cmp(&b.0));
    sink.plot(&PlotSeries {
        title: format!(
            "finite vs infinite (J={}, g={})",
            report.coupling_j, report.transverse_field
        ),
        x_label: "1 / L".to_string(),
        y_label: "energy per site".to_string(),
        points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tfim_core::SolverResult;
    use tfim_solve::{CallCounter, ExactDiagonalization};

    /// Stands in for iDMRG with the free-fermion value.
    struct Exact;

    impl SolverAdapter for Exact {
        fn name(&self) -> &str {
            "exact"
        }

        fn solve(
            &self,
            model: &ModelParameters,
            control: ControlParameter,
        ) -> Result<SolverResult, TfimError> {
            SolverResult::new(
                control,
                thermodynamic_energy_density(model.coupling_j(), model.transverse_field()),
            )
        }
    }

    struct Broken;

    impl SolverAdapter for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn solve(
            &self,
            _model: &ModelParameters,
            _control: ControlParameter,
        ) -> Result<SolverResult, TfimError> {
            Err(TfimError::solver("broken", "engine missing"))
        }
    }

    fn spec(lengths: &[u32]) -> ComparisonSpec {
        ComparisonSpec {
            chain_lengths: lengths.to_vec(),
            bond_dimension: 100,
        }
    }

    #[test]
    fn fit_recovers_a_line() {
        let points = [(0.1, 2.0 + 0.3), (0.2, 2.0 + 0.6), (0.5, 2.0 + 1.5)];
        let (a, b) = linear_fit(&points).expect("fit");
        assert!((a - 2.0).abs() < 1e-12);
        assert!((b - 3.0).abs() < 1e-12);
        assert_eq!(linear_fit(&[(0.25, -1.0)]), Some((-1.0, 0.0)));
        assert_eq!(linear_fit(&[]), None);
    }

    #[test]
    fn gapped_chain_extrapolates_near_the_exact_value() {
        let model = ModelParameters::new(1.0, 0.5, 2).expect("model");
        let report = compare_finite_infinite(
            &ExactDiagonalization::default(),
            &Exact,
            &model,
            &spec(&[4, 6, 8, 10, 12]),
        )
        .expect("compare");
        assert_eq!(report.ed_energies.len(), 5);
        assert!((report.idmrg_energy - report.exact_energy).abs() < 1e-12);
        assert!(report.difference.abs() < 1e-3, "{report:?}");
    }

    #[test]
    fn long_chains_are_rejected_before_any_call() {
        let ed = CallCounter::new(ExactDiagonalization::default());
        let model = ModelParameters::new(1.0, 1.0, 2).expect("model");
        let err = compare_finite_infinite(&ed, &Exact, &model, &spec(&[4, 8, 14]))
            .expect_err("ceiling");
        assert!(matches!(err, RunError::Rejected(_)));
        assert_eq!(ed.count(), 0);
    }

    #[test]
    fn infinite_failure_keeps_the_exact_points() {
        let model = ModelParameters::new(1.0, 1.0, 2).expect("model");
        let err = compare_finite_infinite(
            &ExactDiagonalization::default(),
            &Broken,
            &model,
            &spec(&[4, 6]),
        )
        .expect_err("broken");
        assert_eq!(err.partial().map(|t| t.len()), Some(2));
    }
}
