//! Infinite DMRG delegated to an external tensor-network engine.
//!
//! One process is spawned per solve. It receives a single JSON request on
//! stdin and must print a JSON response as the last non-empty line of its
//! stdout. Anything printed before that line is treated as engine chatter.

use std::collections::BTreeMap;
use std::io::Write;
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};
use tfim_core::{
    ControlAxis, ControlParameter, ErrorInfo, ModelParameters, SolverResult, TfimError,
};
use tracing::debug;

use crate::adapter::SolverAdapter;

/// Engine settings forwarded verbatim to the external process.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IdmrgSettings {
    /// Singular values below this are discarded.
    #[serde(default = "IdmrgSettings::default_svd_min")]
    pub svd_min: f64,
    /// Energy change below which sweeping stops.
    #[serde(default = "IdmrgSettings::default_max_err")]
    pub max_e_err: f64,
    /// Entropy change below which sweeping stops.
    #[serde(default = "IdmrgSettings::default_max_err")]
    pub max_s_err: f64,
    /// Upper bound on sweeps per solve.
    #[serde(default = "IdmrgSettings::default_max_sweeps")]
    pub max_sweeps: u32,
    /// Environment updates between sweeps.
    #[serde(default = "IdmrgSettings::default_env")]
    pub update_env: u32,
    /// Environment sweeps before the first update.
    #[serde(default = "IdmrgSettings::default_env")]
    pub start_env: u32,
    /// Enables the subspace-expansion mixer.
    #[serde(default)]
    pub mixer: bool,
    /// Number of sites in the `correlation_xx` profile.
    #[serde(default = "IdmrgSettings::default_correlation_range")]
    pub correlation_range: u32,
}

impl IdmrgSettings {
    const fn default_svd_min() -> f64 {
        1e-10
    }

    const fn default_max_err() -> f64 {
        1e-4
    }

    const fn default_max_sweeps() -> u32 {
        100
    }

    const fn default_env() -> u32 {
        5
    }

    const fn default_correlation_range() -> u32 {
        20
    }
}

impl Default for IdmrgSettings {
    fn default() -> Self {
        Self {
            svd_min: Self::default_svd_min(),
            max_e_err: Self::default_max_err(),
            max_s_err: Self::default_max_err(),
            max_sweeps: Self::default_max_sweeps(),
            update_env: Self::default_env(),
            start_env: Self::default_env(),
            mixer: false,
            correlation_range: Self::default_correlation_range(),
        }
    }
}

/// Request written to the engine's stdin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdmrgRequest {
    /// Ising coupling `J`.
    pub coupling_j: f64,
    /// Transverse field `g`.
    pub transverse_field: f64,
    /// Unit-cell length of the infinite MPS.
    pub unit_cell_length: u32,
    /// Maximum bond dimension.
    pub bond_dimension: u32,
    /// Engine settings.
    pub settings: IdmrgSettings,
}

/// Response read from the engine's stdout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdmrgResponse {
    /// Ground state energy per site.
    #[serde(default)]
    pub energy_density: Option<f64>,
    /// Scalar observables (entropy, correlation length, magnetization).
    /// `null` marks a value the engine could not compute.
    #[serde(default)]
    pub observables: BTreeMap<String, Option<f64>>,
    /// Array observables.
    #[serde(default)]
    pub profiles: BTreeMap<String, Vec<f64>>,
    /// Engine-reported failure.
    #[serde(default)]
    pub error: Option<String>,
}

/// Adapter running iDMRG through an external command.
///
/// When the unit cell is swept, every solve uses the fixed bond dimension
/// given at construction. When the bond dimension is swept, the unit cell
/// comes from the model.
#[derive(Debug, Clone)]
pub struct ExternalIdmrg {
    command: Vec<String>,
    settings: IdmrgSettings,
    bond_dimension: Option<u32>,
}

impl ExternalIdmrg {
    /// Adapter name recorded in provenance.
    pub const NAME: &'static str = "external-idmrg";

    /// Builds the adapter; the command must not be empty.
    pub fn new(
        command: Vec<String>,
        settings: IdmrgSettings,
        bond_dimension: Option<u32>,
    ) -> Result<Self, TfimError> {
        if command.first().map_or(true, |program| program.trim().is_empty()) {
            return Err(TfimError::Config(
                ErrorInfo::new("idmrg.command", "iDMRG command line is empty")
                    .with_hint("set idmrg.command in the configuration file"),
            ));
        }
        if bond_dimension == Some(0) {
            return Err(TfimError::validation(
                "idmrg.bond_dimension",
                "bond dimension must be at least 1",
            ));
        }
        Ok(Self {
            command,
            settings,
            bond_dimension,
        })
    }

    /// Builds the request for a solve without running it.
    pub fn request(
        &self,
        model: &ModelParameters,
        control: ControlParameter,
    ) -> Result<IdmrgRequest, TfimError> {
        let (unit_cell_length, bond_dimension) = match control.axis {
            ControlAxis::BondDimension => (model.length(), control.value),
            ControlAxis::UnitCellSize => {
                let chi = self.bond_dimension.ok_or_else(|| {
                    TfimError::Validation(
                        ErrorInfo::new(
                            "idmrg.missing_bond_dimension",
                            "a unit-cell sweep needs a fixed bond dimension",
                        )
                        .with_context("unit_cell_length", control.value.to_string()),
                    )
                })?;
                (control.value, chi)
            }
        };
        Ok(IdmrgRequest {
            coupling_j: model.coupling_j(),
            transverse_field: model.transverse_field(),
            unit_cell_length,
            bond_dimension,
            settings: self.settings,
        })
    }

    fn run(&self, request: &IdmrgRequest) -> Result<IdmrgResponse, TfimError> {
        let payload = serde_json::to_vec(request)
            .map_err(|err| TfimError::Serde(ErrorInfo::new("idmrg.encode", err.to_string())))?;
        let program = &self.command[0];
        let mut child = Command::new(program)
            .args(&self.command[1..])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| {
                TfimError::Solver(
                    ErrorInfo::new("idmrg.spawn", err.to_string())
                        .with_context("program", program.clone()),
                )
            })?;
        if let Some(mut stdin) = child.stdin.take() {
            if let Err(err) = stdin.write_all(&payload) {
                // Reap the child before bailing out.
                let _ = child.kill();
                let _ = child.wait();
                return Err(TfimError::Solver(ErrorInfo::new("idmrg.stdin", err.to_string())));
            }
        }
        let output = child
            .wait_with_output()
            .map_err(|err| TfimError::Solver(ErrorInfo::new("idmrg.wait", err.to_string())))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TfimError::Solver(
                ErrorInfo::new("idmrg.exit", "iDMRG engine exited with failure")
                    .with_context("status", output.status.to_string())
                    .with_context("stderr", tail(&stderr, 400)),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let line = stdout
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .ok_or_else(|| TfimError::solver("idmrg.empty_output", "engine printed nothing"))?;
        serde_json::from_str(line).map_err(|err| {
            TfimError::Solver(
                ErrorInfo::new("idmrg.decode", err.to_string()).with_context("line", tail(line, 200)),
            )
        })
    }
}

fn tail(text: &str, max_chars: usize) -> String {
    let count = text.chars().count();
    text.chars().skip(count.saturating_sub(max_chars)).collect()
}

impl SolverAdapter for ExternalIdmrg {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn check(&self, model: &ModelParameters, control: ControlParameter) -> Result<(), TfimError> {
        self.request(model, control).map(|_| ())
    }

    fn solve(
        &self,
        model: &ModelParameters,
        control: ControlParameter,
    ) -> Result<SolverResult, TfimError> {
        let request = self.request(model, control)?;
        let response = self.run(&request)?;
        if let Some(message) = response.error {
            return Err(TfimError::Solver(
                ErrorInfo::new("idmrg.engine", message)
                    .with_context("unit_cell_length", request.unit_cell_length.to_string())
                    .with_context("bond_dimension", request.bond_dimension.to_string()),
            ));
        }
        let energy = response.energy_density.ok_or_else(|| {
            TfimError::solver("idmrg.missing_energy", "response carries no energy_density")
        })?;
        debug!(
            unit_cell_length = request.unit_cell_length,
            bond_dimension = request.bond_dimension,
            energy_density = energy,
            "iDMRG solve finished"
        );
        let mut result = SolverResult::new(control, energy)?;
        result.observables = response
            .observables
            .into_iter()
            .filter_map(|(name, value)| value.filter(|v| v.is_finite()).map(|v| (name, v)))
            .collect();
        result.profiles = response.profiles;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> ModelParameters {
        ModelParameters::new(1.0, 0.5, 2).expect("model")
    }

    #[test]
    fn requests_pick_the_swept_axis() {
        let adapter =
            ExternalIdmrg::new(vec!["engine".into()], IdmrgSettings::default(), Some(64))
                .expect("adapter");
        let by_chi = adapter
            .request(&model(), ControlParameter::bond_dimension(150).expect("control"))
            .expect("request");
        assert_eq!((by_chi.unit_cell_length, by_chi.bond_dimension), (2, 150));
        let by_cell = adapter
            .request(&model(), ControlParameter::unit_cell(6).expect("control"))
            .expect("request");
        assert_eq!((by_cell.unit_cell_length, by_cell.bond_dimension), (6, 64));
    }

    #[test]
    fn unit_cell_sweep_needs_a_bond_dimension() {
        let adapter = ExternalIdmrg::new(vec!["engine".into()], IdmrgSettings::default(), None)
            .expect("adapter");
        let err = adapter
            .request(&model(), ControlParameter::unit_cell(4).expect("control"))
            .expect_err("missing chi");
        assert!(err.is_validation());
    }

    #[test]
    fn empty_command_is_a_config_error() {
        let err = ExternalIdmrg::new(Vec::new(), IdmrgSettings::default(), None)
            .expect_err("empty");
        assert_eq!(err.family(), "Config");
    }

    #[cfg(unix)]
    fn shell(script: &str) -> ExternalIdmrg {
        ExternalIdmrg::new(
            vec!["sh".into(), "-c".into(), script.into()],
            IdmrgSettings::default(),
            None,
        )
        .expect("adapter")
    }

    #[cfg(unix)]
    #[test]
    fn parses_the_last_stdout_line() {
        let adapter = shell(
            r#"cat >/dev/null; echo "sweeping..."; echo '{"energy_density": -1.0635, "observables": {"correlation_length": 2.5}, "profiles": {"correlation_xx": [1.0, 0.6]}}'"#,
        );
        let control = ControlParameter::bond_dimension(50).expect("control");
        let result = adapter.solve(&model(), control).expect("solve");
        assert_eq!(result.energy_density, -1.0635);
        assert_eq!(result.observables["correlation_length"], 2.5);
        assert_eq!(result.profiles["correlation_xx"], vec![1.0, 0.6]);
    }

    #[cfg(unix)]
    #[test]
    fn uncomputable_observables_are_dropped() {
        let adapter = shell(
            r#"cat >/dev/null; echo '{"energy_density": -1.06, "observables": {"correlation_length": null, "entanglement_entropy": 0.4}}'"#,
        );
        let control = ControlParameter::bond_dimension(50).expect("control");
        let result = adapter.solve(&model(), control).expect("solve");
        assert_eq!(result.energy_density, -1.06);
        assert!(!result.observables.contains_key("correlation_length"));
        assert_eq!(result.observables["entanglement_entropy"], 0.4);
    }

    #[cfg(unix)]
    #[test]
    fn engine_ignoring_its_input_is_a_solver_error() {
        let control = ControlParameter::bond_dimension(50).expect("control");
        let err = shell("exec 0<&-; exit 0")
            .solve(&model(), control)
            .expect_err("no answer");
        assert_eq!(err.family(), "Solver");
    }

    #[cfg(unix)]
    #[test]
    fn engine_failures_are_solver_errors() {
        let control = ControlParameter::bond_dimension(50).expect("control");
        let exit = shell("cat >/dev/null; echo boom >&2; exit 3")
            .solve(&model(), control)
            .expect_err("exit");
        assert_eq!(exit.info().code, "idmrg.exit");
        assert!(exit.info().context["stderr"].contains("boom"));

        let reported = shell(r#"cat >/dev/null; echo '{"error": "sweeps did not stabilize"}'"#)
            .solve(&model(), control)
            .expect_err("engine");
        assert_eq!(reported.info().code, "idmrg.engine");

        let nan = shell(r#"cat >/dev/null; echo '{"energy_density": null}'"#)
            .solve(&model(), control)
            .expect_err("missing");
        assert_eq!(nan.family(), "Solver");
    }
}
