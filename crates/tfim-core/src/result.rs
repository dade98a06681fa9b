use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorInfo, TfimError};
use crate::params::ControlParameter;

/// Output of a single ground-state solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverResult {
    /// Control value the solve ran at.
    pub control: ControlParameter,
    /// Ground state energy per site.
    pub energy_density: f64,
    /// Scalar auxiliary observables keyed by name.
    #[serde(default)]
    pub observables: BTreeMap<String, f64>,
    /// Array valued observables such as correlation profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Vec<f64>>,
}

impl SolverResult {
    /// Builds a result carrying only an energy density.
    ///
    /// Non-finite energies are a solver failure.
    pub fn new(control: ControlParameter, energy_density: f64) -> Result<Self, TfimError> {
        if !energy_density.is_finite() {
            return Err(TfimError::Solver(
                ErrorInfo::new("solver.non_finite", "solver returned a non-finite energy")
                    .with_context("control", control.to_string())
                    .with_context("energy_density", energy_density.to_string()),
            ));
        }
        Ok(Self {
            control,
            energy_density,
            observables: BTreeMap::new(),
            profiles: BTreeMap::new(),
        })
    }

    /// Attaches a scalar observable.
    pub fn with_observable(mut self, name: impl Into<String>, value: f64) -> Self {
        self.observables.insert(name.into(), value);
        self
    }

    /// Attaches an array observable.
    pub fn with_profile(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.profiles.insert(name.into(), values);
        self
    }
}
