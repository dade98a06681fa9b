//! Tool results and the response envelope.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tfim_conv::{ComparisonReport, ConvergenceReport};
use tfim_core::{ErrorInfo, RunProvenance, TfimError};

/// Result of `diagonalize`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagonalizeResult {
    /// Chain length.
    #[serde(rename = "L")]
    pub length: u32,
    /// Ground state energy per site.
    pub energy_per_site: f64,
    /// Free-fermion energy per site of the same chain.
    pub exact_reference: f64,
    /// Auxiliary observables of the ground state.
    pub observables: BTreeMap<String, f64>,
    /// Solver calls issued.
    pub solver_calls: usize,
    /// Request hash and timing.
    pub provenance: RunProvenance,
}

/// Result of `analyze_ground_state`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundStateResult {
    /// Ground state energy per site at the accepted bond dimension.
    pub energy_per_site: f64,
    /// Bond dimension the properties were taken at.
    pub bond_dimension: u32,
    /// Unit-cell length.
    pub unit_cell_length: u32,
    /// Scalar observables such as entropy and correlation length.
    pub observables: BTreeMap<String, f64>,
    /// Array observables such as the `correlation_xx` profile.
    pub profiles: BTreeMap<String, Vec<f64>>,
    /// Refinement record, present in adaptive mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refinement: Option<ConvergenceReport>,
    /// Solver calls issued.
    pub solver_calls: usize,
    /// Request hash and timing.
    pub provenance: RunProvenance,
}

/// Result of `analyze_unit_cell_convergence`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitCellResult {
    /// Sweep over the unit-cell lengths.
    #[serde(flatten)]
    pub report: ConvergenceReport,
    /// Bond dimension used for every point.
    pub bond_dimension: Option<u32>,
    /// Bond-dimension refinement run when none was fixed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bond_dimension_refinement: Option<ConvergenceReport>,
}

/// Result of `compare_finite_infinite`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// Exact energies, extrapolation and infinite-chain value.
    #[serde(flatten)]
    pub report: ComparisonReport,
    /// Figure location when one was requested.
    #[serde(default)]
    pub plot_path: Option<String>,
    /// Plotting failure; the numbers are still valid.
    #[serde(default)]
    pub plot_failure: Option<ErrorInfo>,
    /// Solver calls issued, both engines included.
    pub solver_calls: usize,
    /// Request hash and timing.
    pub provenance: RunProvenance,
}

/// Envelope returned for every tool call.
///
/// A failed run may still carry the partial numbers in `result`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResponse {
    /// Tool that handled the request.
    pub tool: String,
    /// True when the run completed.
    pub ok: bool,
    /// Tool specific payload.
    #[serde(default)]
    pub result: Option<Value>,
    /// Failure, tagged by family.
    #[serde(default)]
    pub error: Option<TfimError>,
}

impl ToolResponse {
    /// Successful response.
    pub fn success<T: Serialize>(tool: &str, result: &T) -> Self {
        match to_value(result) {
            Ok(value) => Self {
                tool: tool.to_string(),
                ok: true,
                result: Some(value),
                error: None,
            },
            Err(error) => Self::failure(tool, error),
        }
    }

    /// Failed response without numbers.
    pub fn failure(tool: &str, error: TfimError) -> Self {
        Self {
            tool: tool.to_string(),
            ok: false,
            result: None,
            error: Some(error),
        }
    }

    /// Failed response carrying what was computed before the failure.
    pub fn partial<T: Serialize>(tool: &str, error: TfimError, partial: &T) -> Self {
        Self {
            result: to_value(partial).ok(),
            ..Self::failure(tool, error)
        }
    }

    /// Deserializes the payload into `T`.
    pub fn result_as<T: for<'de> Deserialize<'de>>(&self) -> Result<T, TfimError> {
        let value = self.result.clone().ok_or_else(|| {
            TfimError::Serde(ErrorInfo::new("response.empty", "response carries no result"))
        })?;
        serde_json::from_value(value)
            .map_err(|err| TfimError::Serde(ErrorInfo::new("response.decode", err.to_string())))
    }
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, TfimError> {
    serde_json::to_value(value)
        .map_err(|err| TfimError::Serde(ErrorInfo::new("response.encode", err.to_string())))
}
