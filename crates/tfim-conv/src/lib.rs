#![deny(missing_docs)]
#![doc = "Convergence judging, fixed sweeps and adaptive refinement over TFIM solvers."]

pub mod compare;
/// Pairwise convergence verdicts.
pub mod judge;
/// SVG figures for convergence traces.
pub mod plot;
pub mod refine;
pub mod report;
pub mod schedule;
/// Fixed-list sweeps.
pub mod sweep;
mod trace;

pub use compare::{compare_finite_infinite, linear_fit, ComparisonReport, ComparisonSpec};
pub use judge::{judge, judge_sequence, DeltaRule, Judgement, Tolerance};
pub use plot::{render_line_svg, FigureConfig, PlotSeries, PlotSink, SvgPlotSink};
pub use refine::{refine, Growth, RefineSpec};
pub use report::{report, report_failure, write_csv, ConvergenceReport, ReportOptions};
pub use schedule::{default_bond_dimensions, default_refine_start, default_unit_cells};
pub use sweep::sweep;
pub use trace::{ConvergenceTrace, RunError, TraceStep};
