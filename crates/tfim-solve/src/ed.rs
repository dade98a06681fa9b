use tfim_core::{
    derive_substream_seed, ensure_chain_length, ControlAxis, ControlParameter, ErrorInfo,
    ModelParameters, SolverResult, TfimError,
};
use tracing::debug;

use crate::adapter::SolverAdapter;
use crate::hamiltonian::PeriodicChain;
use crate::lanczos::{lowest_eigenpair, LanczosOptions};

/// Exact diagonalization of the periodic chain.
///
/// The control value is the chain length; bond dimensions mean nothing here
/// and are rejected.
#[derive(Debug, Clone, Default)]
pub struct ExactDiagonalization {
    options: LanczosOptions,
}

impl ExactDiagonalization {
    /// Adapter name recorded in provenance.
    pub const NAME: &'static str = "exact-diagonalization";

    /// Builds the adapter with explicit Lanczos settings.
    pub fn new(options: LanczosOptions) -> Self {
        Self { options }
    }

    /// Lanczos settings in use.
    pub fn options(&self) -> &LanczosOptions {
        &self.options
    }
}

impl SolverAdapter for ExactDiagonalization {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn check(&self, model: &ModelParameters, control: ControlParameter) -> Result<(), TfimError> {
        if control.axis != ControlAxis::UnitCellSize {
            return Err(TfimError::Validation(
                ErrorInfo::new(
                    "ed.axis",
                    "exact diagonalization is controlled by the chain length only",
                )
                .with_context("axis", control.axis.label()),
            ));
        }
        ensure_chain_length(control.value)?;
        model.with_length(control.value).map(|_| ())
    }

    fn solve(
        &self,
        model: &ModelParameters,
        control: ControlParameter,
    ) -> Result<SolverResult, TfimError> {
        self.check(model, control)?;
        let model = model.with_length(control.value)?;
        let chain = PeriodicChain::new(&model)?;

        let options = LanczosOptions {
            seed: derive_substream_seed(self.options.seed, u64::from(control.value)),
            ..self.options
        };
        let pair = lowest_eigenpair(chain.dim(), |x, y| chain.apply(x, y), &options)?;
        let sites = f64::from(chain.sites());
        let energy_density = pair.value / sites;
        debug!(
            sites = chain.sites(),
            dim = chain.dim(),
            iterations = pair.iterations,
            energy_density,
            "exact diagonalization finished"
        );

        Ok(SolverResult::new(control, energy_density)?
            .with_observable("magnetization_x", chain.magnetization_x(&pair.vector))
            .with_observable("correlation_zz_nn", chain.correlation_zz_nn(&pair.vector)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exact::periodic_chain_energy_density;

    fn solve(length: u32, coupling: f64, field: f64) -> Result<SolverResult, TfimError> {
        let model = ModelParameters::new(coupling, field, length)?;
        let control = ControlParameter::unit_cell(length)?;
        ExactDiagonalization::default().solve(&model, control)
    }

    #[test]
    fn two_sites_match_hand_result() {
        let result = solve(2, 1.0, 0.5).expect("solve");
        let expected = -(1.0f64 + 0.25).sqrt();
        assert!((result.energy_density - expected).abs() < 1e-10);
    }

    #[test]
    fn krylov_sizes_match_free_fermions() {
        for &(length, field) in &[(8u32, 0.7), (10, 1.0), (12, 0.6)] {
            let result = solve(length, 1.0, field).expect("solve");
            let expected = periodic_chain_energy_density(1.0, field, length);
            assert!(
                (result.energy_density - expected).abs() < 1e-8,
                "L={length} h={field}: {} vs {expected}",
                result.energy_density
            );
        }
    }

    #[test]
    fn observables_reassemble_the_energy() {
        let (coupling, field) = (1.0, 0.8);
        let result = solve(8, coupling, field).expect("solve");
        let mx = result.observables["magnetization_x"];
        let zz = result.observables["correlation_zz_nn"];
        let rebuilt = -coupling * zz - field * mx;
        assert!((rebuilt - result.energy_density).abs() < 1e-6);
        assert!(mx > 0.0);
    }

    #[test]
    fn long_chains_and_bond_dimensions_are_rejected() {
        let err = solve(13, 1.0, 0.5).expect_err("ceiling");
        assert_eq!(err.info().code, "model.chain_too_long");

        let model = ModelParameters::new(1.0, 0.5, 4).expect("model");
        let control = ControlParameter::bond_dimension(50).expect("control");
        let err = ExactDiagonalization::default()
            .solve(&model, control)
            .expect_err("axis");
        assert_eq!(err.info().code, "ed.axis");
    }
}
