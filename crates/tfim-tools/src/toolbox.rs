//! Dispatch of tool requests onto solvers and convergence studies.

use serde::Serialize;
use serde_json::Value;
use tfim_conv::compare::plot_comparison;
use tfim_conv::{
    compare_finite_infinite, default_bond_dimensions, default_refine_start, default_unit_cells,
    refine, report, report_failure, sweep, ComparisonSpec, ConvergenceReport, ConvergenceTrace,
    RefineSpec, ReportOptions, RunError, SvgPlotSink, Tolerance,
};
use tfim_core::{
    ControlAxis, ControlParameter, ErrorInfo, ModelParameters, RunProvenance, TfimError,
};
use tfim_solve::{periodic_chain_energy_density, CallCounter, SolverAdapter};
use tracing::info;

use crate::config::ToolConfig;
use crate::factory::{DefaultSolverFactory, SolverFactory};
use crate::requests::{
    BondDimensionRequest, ComparisonRequest, DiagonalizeRequest, GroundStateRequest, Precision,
    ToolRequest, UnitCellRequest,
};
use crate::responses::{
    ComparisonResult, DiagonalizeResult, GroundStateResult, ToolResponse, UnitCellResult,
};
use crate::values::{parse_values, values_or};

/// Answers tool requests. Holds no state between calls.
#[derive(Debug, Clone)]
pub struct Toolbox<F = DefaultSolverFactory> {
    factory: F,
    config: ToolConfig,
}

impl Toolbox<DefaultSolverFactory> {
    /// Toolbox with the default solvers configured by `config`.
    pub fn from_config(config: ToolConfig) -> Self {
        Self::new(DefaultSolverFactory::new(config.clone()), config)
    }
}

impl<F: SolverFactory> Toolbox<F> {
    /// Toolbox building its solvers through `factory`.
    pub fn new(factory: F, config: ToolConfig) -> Self {
        Self { factory, config }
    }

    /// Configuration in use.
    pub fn config(&self) -> &ToolConfig {
        &self.config
    }

    /// Parses a JSON request and dispatches it.
    pub fn dispatch_json(&self, text: &str) -> ToolResponse {
        match serde_json::from_str::<ToolRequest>(text) {
            Ok(request) => self.dispatch(&request),
            Err(err) => {
                let tool = serde_json::from_str::<Value>(text)
                    .ok()
                    .and_then(|value| value.get("tool").and_then(Value::as_str).map(str::to_owned))
                    .unwrap_or_else(|| "unknown".to_string());
                ToolResponse::failure(
                    &tool,
                    TfimError::Serde(
                        ErrorInfo::new("request.decode", err.to_string())
                            .with_hint("see `tfim-sim tools` for the accepted requests"),
                    ),
                )
            }
        }
    }

    /// Runs one request.
    pub fn dispatch(&self, request: &ToolRequest) -> ToolResponse {
        let tool = request.name();
        info!(tool, "tool request received");
        let outcome = match request {
            ToolRequest::Diagonalize(req) => self.diagonalize(request, req),
            ToolRequest::AnalyzeGroundState(req) => self.ground_state(request, req),
            ToolRequest::AnalyzeUnitCellConvergence(req) => self.unit_cell(request, req),
            ToolRequest::AnalyzeBondDimensionConvergence(req) => self.bond_dimension(request, req),
            ToolRequest::CompareFiniteInfinite(req) => self.compare(request, req),
        };
        let response = outcome.unwrap_or_else(|error| ToolResponse::failure(tool, error));
        if let Some(error) = &response.error {
            info!(tool, family = error.family(), code = %error.info().code, "tool request failed");
        }
        response
    }

    fn diagonalize(
        &self,
        request: &ToolRequest,
        req: &DiagonalizeRequest,
    ) -> Result<ToolResponse, TfimError> {
        let model = ModelParameters::new(req.coupling_j, req.field, req.length)?;
        let control = ControlParameter::unit_cell(req.length)?;
        let solver = CallCounter::new(self.factory.exact()?);
        solver.check(&model, control)?;
        let provenance = RunProvenance::capture(request, solver.name())?;
        let result = solver.solve(&model, control)?;
        Ok(ToolResponse::success(
            request.name(),
            &DiagonalizeResult {
                length: req.length,
                energy_per_site: result.energy_density,
                exact_reference: periodic_chain_energy_density(
                    req.coupling_j,
                    req.field,
                    req.length,
                ),
                observables: result.observables,
                solver_calls: solver.count(),
                provenance,
            },
        ))
    }

    fn ground_state(
        &self,
        request: &ToolRequest,
        req: &GroundStateRequest,
    ) -> Result<ToolResponse, TfimError> {
        let tool = request.name();
        let model = ModelParameters::new(req.coupling_j, req.g, req.unit_cell_length)?;
        let solver = CallCounter::new(self.factory.idmrg(None)?);
        let provenance = RunProvenance::capture(request, solver.name())?;

        if let Precision::Fixed { bond_dimension } = req.precision {
            let control = ControlParameter::bond_dimension(bond_dimension)?;
            solver.check(&model, control)?;
            let result = solver.solve(&model, control)?;
            return Ok(ToolResponse::success(
                tool,
                &GroundStateResult {
                    energy_per_site: result.energy_density,
                    bond_dimension,
                    unit_cell_length: req.unit_cell_length,
                    observables: result.observables,
                    profiles: result.profiles,
                    refinement: None,
                    solver_calls: solver.count(),
                    provenance,
                },
            ));
        }

        let spec = self.adaptive_spec(&req.precision, &model);
        let outcome = refine(&solver, &model, &spec);
        let options = ReportOptions::new(ControlAxis::BondDimension, spec.tolerance, solver.count());
        let trace = match outcome {
            Ok(trace) => trace,
            Err(err) => return Ok(failed_report(tool, err, &options, provenance)),
        };
        let mut refinement = report(&trace, &options);
        refinement.provenance = Some(provenance.clone());
        let accepted = trace.accepted_result().cloned().ok_or_else(|| {
            TfimError::solver("refine.no_result", "refinement produced no result")
        })?;
        Ok(ToolResponse::success(
            tool,
            &GroundStateResult {
                energy_per_site: accepted.energy_density,
                bond_dimension: accepted.control.value,
                unit_cell_length: req.unit_cell_length,
                observables: accepted.observables,
                profiles: accepted.profiles,
                refinement: Some(refinement),
                solver_calls: solver.count(),
                provenance,
            },
        ))
    }

    fn unit_cell(
        &self,
        request: &ToolRequest,
        req: &UnitCellRequest,
    ) -> Result<ToolResponse, TfimError> {
        let tool = request.name();
        let values = values_or(req.unit_cell_lengths.as_deref(), default_unit_cells)?;
        let tolerance = Tolerance {
            threshold: req.threshold,
            rule: req.rule,
        };
        tolerance.validate()?;
        let largest = values.iter().copied().max().ok_or_else(|| {
            TfimError::validation("sweep.empty", "sweep needs at least one control value")
        })?;
        let model = ModelParameters::new(req.coupling_j, req.g, largest)?;

        let mut calls = 0;
        let (bond_dimension, bond_dimension_refinement) = match req.bond_dimension {
            Some(chi) => (chi, None),
            None => {
                let solver = CallCounter::new(self.factory.idmrg(None)?);
                let provenance = RunProvenance::capture(request, solver.name())?;
                let spec = self.adaptive_spec(&Precision::default(), &model);
                let outcome = refine(&solver, &model, &spec);
                calls += solver.count();
                let options = ReportOptions::new(ControlAxis::BondDimension, spec.tolerance, calls);
                let trace = match outcome {
                    Ok(trace) => trace,
                    Err(err) => return Ok(failed_report(tool, err, &options, provenance)),
                };
                let chi = trace.accepted.ok_or_else(|| {
                    TfimError::solver("refine.no_result", "refinement produced no result")
                })?;
                (chi, Some(report(&trace, &options)))
            }
        };

        let solver = CallCounter::new(self.factory.idmrg(Some(bond_dimension))?);
        let provenance = RunProvenance::capture(request, solver.name())?;
        let outcome = sweep(&solver, &model, ControlAxis::UnitCellSize, &values, &tolerance);
        calls += solver.count();

        let sink = SvgPlotSink::new(&self.config.output.plot_dir);
        let title = format!(
            "unit cell convergence J={} g={} chi={}",
            req.coupling_j, req.g, bond_dimension
        );
        let mut options = ReportOptions::new(ControlAxis::UnitCellSize, tolerance, calls);
        if req.make_plot {
            options = options.with_plot(&sink, &title);
        }
        Ok(respond(tool, outcome, &options, provenance, |report| {
            UnitCellResult {
                report,
                bond_dimension: Some(bond_dimension),
                bond_dimension_refinement,
            }
        }))
    }

    fn bond_dimension(
        &self,
        request: &ToolRequest,
        req: &BondDimensionRequest,
    ) -> Result<ToolResponse, TfimError> {
        let tool = request.name();
        let values = values_or(req.bond_dimensions.as_deref(), || {
            default_bond_dimensions(req.g, req.coupling_j, req.unit_cell_length)
        })?;
        let tolerance = Tolerance {
            threshold: req.threshold,
            rule: req.rule,
        };
        let model = ModelParameters::new(req.coupling_j, req.g, req.unit_cell_length)?;
        let solver = CallCounter::new(self.factory.idmrg(None)?);
        let provenance = RunProvenance::capture(request, solver.name())?;
        let outcome = sweep(&solver, &model, ControlAxis::BondDimension, &values, &tolerance);

        let sink = SvgPlotSink::new(&self.config.output.plot_dir);
        let title = format!(
            "bond dimension convergence J={} g={} L={}",
            req.coupling_j, req.g, req.unit_cell_length
        );
        let mut options = ReportOptions::new(ControlAxis::BondDimension, tolerance, solver.count());
        if req.make_plot {
            options = options.with_plot(&sink, &title);
        }
        Ok(respond(tool, outcome, &options, provenance, |report| report))
    }

    fn compare(
        &self,
        request: &ToolRequest,
        req: &ComparisonRequest,
    ) -> Result<ToolResponse, TfimError> {
        let tool = request.name();
        let spec = ComparisonSpec {
            chain_lengths: parse_values(&req.chain_lengths)?,
            bond_dimension: req.bond_dimension,
        };
        let model = ModelParameters::new(req.coupling_j, req.g, req.unit_cell_length)?;
        let ed = CallCounter::new(self.factory.exact()?);
        let idmrg = CallCounter::new(self.factory.idmrg(None)?);
        let provenance =
            RunProvenance::capture(request, format!("{}+{}", ed.name(), idmrg.name()))?;
        let outcome = compare_finite_infinite(&ed, &idmrg, &model, &spec);
        let calls = ed.count() + idmrg.count();

        let report = match outcome {
            Ok(report) => report,
            Err(err) => {
                let options = ReportOptions::new(ControlAxis::UnitCellSize, Tolerance::default(), calls);
                return Ok(failed_report(tool, err, &options, provenance));
            }
        };
        let (plot_path, plot_failure) = if req.make_plot {
            let sink = SvgPlotSink::new(&self.config.output.plot_dir);
            match plot_comparison(&report, &sink) {
                Ok(path) => (Some(path), None),
                Err(err) => (None, Some(err)),
            }
        } else {
            (None, None)
        };
        let result = ComparisonResult {
            report,
            plot_path,
            plot_failure: plot_failure.as_ref().map(|err| err.info().clone()),
            solver_calls: calls,
            provenance,
        };
        Ok(match plot_failure {
            None => ToolResponse::success(tool, &result),
            Some(error) => ToolResponse::partial(tool, error, &result),
        })
    }

    /// Bond-dimension refinement settings: request overrides, then the
    /// configuration, then the default schedule for the start value.
    fn adaptive_spec(&self, precision: &Precision, model: &ModelParameters) -> RefineSpec {
        let defaults = self.config.refine;
        let (start, growth, threshold, rule, max_calls) = match *precision {
            Precision::Adaptive {
                start,
                growth,
                threshold,
                rule,
                max_calls,
            } => (start, growth, threshold, rule, max_calls),
            Precision::Fixed { .. } => (None, None, None, None, None),
        };
        let start = start.or(defaults.start).unwrap_or_else(|| {
            default_refine_start(model.transverse_field(), model.coupling_j(), model.length())
        });
        RefineSpec {
            axis: ControlAxis::BondDimension,
            start,
            growth: growth.unwrap_or(defaults.growth),
            tolerance: Tolerance {
                threshold: threshold.unwrap_or(defaults.threshold),
                rule: rule.unwrap_or(defaults.rule),
            },
            max_calls: max_calls.unwrap_or(defaults.max_calls),
        }
    }
}

fn failed_report(
    tool: &str,
    err: RunError,
    options: &ReportOptions<'_>,
    provenance: RunProvenance,
) -> ToolResponse {
    let error = err.error().clone();
    let mut partial = report_failure(err, options);
    partial.provenance = Some(provenance);
    ToolResponse::partial(tool, error, &partial)
}

fn respond<T: Serialize>(
    tool: &str,
    outcome: Result<ConvergenceTrace, RunError>,
    options: &ReportOptions<'_>,
    provenance: RunProvenance,
    wrap: impl FnOnce(ConvergenceReport) -> T,
) -> ToolResponse {
    let (mut out, error) = match outcome {
        Ok(trace) => {
            let out = report(&trace, options);
            let error = out.failure.clone().map(TfimError::Io);
            (out, error)
        }
        Err(err) => {
            let error = err.error().clone();
            (report_failure(err, options), Some(error))
        }
    };
    out.provenance = Some(provenance);
    let payload = wrap(out);
    match error {
        None => ToolResponse::success(tool, &payload),
        Some(error) => ToolResponse::partial(tool, error, &payload),
    }
}
