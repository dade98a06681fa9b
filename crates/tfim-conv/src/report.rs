//! Packaging of convergence traces for callers.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;

use csv::WriterBuilder;
use serde::{Deserialize, Serialize};
use tfim_core::{ControlAxis, ErrorInfo, RunProvenance, SolverResult, TfimError};
use tracing::warn;

use crate::judge::Tolerance;
use crate::plot::{PlotSeries, PlotSink};
use crate::trace::{ConvergenceTrace, RunError};

/// Caller-facing summary of a sweep or refinement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceReport {
    /// Swept axis.
    pub axis: ControlAxis,
    /// Control values in call order.
    pub control_values: Vec<u32>,
    /// Energy per site for each step.
    pub energy_densities: Vec<f64>,
    /// Delta to the previous step; `None` for the first.
    pub deltas: Vec<Option<f64>>,
    /// Per-step auxiliary observables; `None` where a step lacks the name.
    pub observables: BTreeMap<String, Vec<Option<f64>>>,
    /// Criterion the run was judged with.
    pub tolerance: Tolerance,
    /// Whether any consecutive pair met the tolerance.
    pub converged: bool,
    /// Accepted control value.
    pub accepted: Option<u32>,
    /// Full result at the accepted value.
    pub accepted_result: Option<SolverResult>,
    /// Solver calls issued, failed calls included.
    pub solver_calls: usize,
    /// Where the figure was written, when one was requested and produced.
    #[serde(default)]
    pub plot_path: Option<String>,
    /// Error that ended the run early, or the plotting failure.
    #[serde(default)]
    pub failure: Option<ErrorInfo>,
    /// Request hash and timing, attached by the tool layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<RunProvenance>,
}

impl ConvergenceReport {
    /// True when the run finished and, if asked, the figure was written.
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

/// How a trace is turned into a report.
#[derive(Clone, Copy)]
pub struct ReportOptions<'a> {
    /// Axis reported for runs rejected before any call.
    pub axis: ControlAxis,
    /// Criterion the run used.
    pub tolerance: Tolerance,
    /// Calls issued, as counted by the caller.
    pub solver_calls: usize,
    /// Figure destination and title.
    pub plot: Option<(&'a dyn PlotSink, &'a str)>,
}

impl<'a> ReportOptions<'a> {
    /// Options without a figure.
    pub fn new(axis: ControlAxis, tolerance: Tolerance, solver_calls: usize) -> Self {
        Self {
            axis,
            tolerance,
            solver_calls,
            plot: None,
        }
    }

    /// Requests a figure titled `title` from `sink`.
    pub fn with_plot(mut self, sink: &'a dyn PlotSink, title: &'a str) -> Self {
        self.plot = Some((sink, title));
        self
    }
}

/// Builds the report of a completed run, plotting if requested.
pub fn report(trace: &ConvergenceTrace, options: &ReportOptions<'_>) -> ConvergenceReport {
    let mut out = tabulate(trace, options);
    if let Some((sink, title)) = options.plot {
        let series = PlotSeries {
            title: title.to_string(),
            x_label: trace.axis.label().to_string(),
            y_label: "energy per site".to_string(),
            points: out
                .control_values
                .iter()
                .zip(&out.energy_densities)
                .map(|(&x, &y)| (f64::from(x), y))
                .collect(),
        };
        match sink.plot(&series) {
            Ok(path) => out.plot_path = Some(path),
            Err(err) => {
                warn!(code = %err.info().code, "plot failed; numbers kept");
                out.failure = Some(err.info().clone());
            }
        }
    }
    out
}

/// Builds the report of a failed run from its partial trace.
pub fn report_failure(error: RunError, options: &ReportOptions<'_>) -> ConvergenceReport {
    let (partial, error) = error.into_parts();
    let trace = partial.unwrap_or_else(|| ConvergenceTrace::new(options.axis));
    let mut out = tabulate(&trace, options);
    out.failure = Some(error.info().clone());
    out
}

fn tabulate(trace: &ConvergenceTrace, options: &ReportOptions<'_>) -> ConvergenceReport {
    let names: BTreeSet<&String> = trace
        .steps
        .iter()
        .flat_map(|step| step.result.observables.keys())
        .collect();
    let observables = names
        .into_iter()
        .map(|name| {
            let column = trace
                .steps
                .iter()
                .map(|step| step.result.observables.get(name).copied())
                .collect();
            (name.clone(), column)
        })
        .collect();
    ConvergenceReport {
        axis: trace.axis,
        control_values: trace.control_values(),
        energy_densities: trace.energy_densities(),
        deltas: trace.steps.iter().map(|step| step.judgement.delta).collect(),
        observables,
        tolerance: options.tolerance,
        converged: trace.converged,
        accepted: trace.accepted,
        accepted_result: trace.accepted_result().cloned(),
        solver_calls: options.solver_calls,
        plot_path: None,
        failure: None,
        provenance: None,
    }
}

fn wrap_csv(code: &str, err: csv::Error) -> TfimError {
    TfimError::Serde(ErrorInfo::new(code, "CSV export failure").with_hint(err.to_string()))
}

/// Writes one CSV row per step: control value, energy, delta, then every
/// observable column in name order. Missing cells are left empty.
pub fn write_csv<W: Write>(report: &ConvergenceReport, writer: W) -> Result<(), TfimError> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(writer);
    let mut header = vec![
        report.axis.label().to_string(),
        "energy_density".to_string(),
        "delta".to_string(),
    ];
    header.extend(report.observables.keys().cloned());
    writer
        .write_record(&header)
        .map_err(|err| wrap_csv("report.csv_header", err))?;

    let cell = |value: Option<f64>| value.map(|v| v.to_string()).unwrap_or_default();
    for (idx, (&control, &energy)) in report
        .control_values
        .iter()
        .zip(&report.energy_densities)
        .enumerate()
    {
        let mut record = vec![
            control.to_string(),
            energy.to_string(),
            cell(report.deltas.get(idx).copied().flatten()),
        ];
        record.extend(
            report
                .observables
                .values()
                .map(|column| cell(column.get(idx).copied().flatten())),
        );
        writer
            .write_record(&record)
            .map_err(|err| wrap_csv("report.csv_row", err))?;
    }
    writer
        .flush()
        .map_err(|err| wrap_csv("report.csv_flush", err.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sweep::sweep;
    use tfim_core::{ControlParameter, ModelParameters};
    use tfim_solve::SolverAdapter;

    struct Tagged;

    impl SolverAdapter for Tagged {
        fn name(&self) -> &str {
            "tagged"
        }

        fn solve(
            &self,
            _model: &ModelParameters,
            control: ControlParameter,
        ) -> Result<SolverResult, TfimError> {
            if control.value == 99 {
                return Err(TfimError::solver("tagged.fail", "no"));
            }
            let result = SolverResult::new(control, -1.0 - 1.0 / f64::from(control.value))?;
            Ok(if control.value >= 4 {
                result.with_observable("entropy", f64::from(control.value).ln())
            } else {
                result
            })
        }
    }

    struct BrokenSink;

    impl PlotSink for BrokenSink {
        fn plot(&self, _series: &PlotSeries) -> Result<String, TfimError> {
            Err(TfimError::Io(ErrorInfo::new("plot.write", "disk full")))
        }
    }

    fn model() -> ModelParameters {
        ModelParameters::new(1.0, 0.5, 2).expect("model")
    }

    fn options() -> ReportOptions<'static> {
        ReportOptions::new(ControlAxis::UnitCellSize, Tolerance::absolute(1e-3), 3)
    }

    #[test]
    fn missing_observables_become_empty_cells() {
        let trace = sweep(
            &Tagged,
            &model(),
            ControlAxis::UnitCellSize,
            &[2, 4, 8],
            &Tolerance::absolute(1e-3),
        )
        .expect("sweep");
        let out = report(&trace, &options());
        assert_eq!(out.control_values, vec![2, 4, 8]);
        assert_eq!(out.observables["entropy"][0], None);
        assert!(out.observables["entropy"][2].is_some());
        assert!(out.is_complete());

        let mut buf = Vec::new();
        write_csv(&out, &mut buf).expect("csv");
        let text = String::from_utf8(buf).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "unit_cell_length,energy_density,delta,entropy");
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("2,-1.5,,"));
    }

    #[test]
    fn failed_runs_keep_partial_numbers() {
        let err = sweep(
            &Tagged,
            &model(),
            ControlAxis::UnitCellSize,
            &[2, 4, 99, 8],
            &Tolerance::absolute(1e-3),
        )
        .expect_err("interrupted");
        let out = report_failure(err, &options());
        assert_eq!(out.control_values, vec![2, 4]);
        assert_eq!(out.failure.as_ref().map(|f| f.code.as_str()), Some("tagged.fail"));
        assert!(!out.is_complete());
    }

    #[test]
    fn plot_failure_keeps_the_numbers() {
        let trace = sweep(
            &Tagged,
            &model(),
            ControlAxis::UnitCellSize,
            &[2, 4],
            &Tolerance::absolute(1e-3),
        )
        .expect("sweep");
        let sink = BrokenSink;
        let out = report(&trace, &options().with_plot(&sink, "energy"));
        assert_eq!(out.energy_densities.len(), 2);
        assert_eq!(out.plot_path, None);
        assert_eq!(out.failure.map(|f| f.code), Some("plot.write".to_string()));
    }

    #[test]
    fn rejected_runs_report_the_requested_axis() {
        let err = RunError::Rejected(TfimError::validation("sweep.empty", "empty"));
        let out = report_failure(err, &options());
        assert!(out.control_values.is_empty());
        assert_eq!(out.axis, ControlAxis::UnitCellSize);
        assert_eq!(out.accepted, None);
    }
}
