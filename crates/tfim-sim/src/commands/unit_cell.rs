use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use tfim_conv::DeltaRule;
use tfim_tools::{ToolRequest, Toolbox, UnitCellRequest};

use super::emit;

#[derive(Args, Debug)]
pub struct UnitCellArgs {
    /// Transverse field g.
    #[arg(long)]
    pub g: f64,
    /// Ising coupling J.
    #[arg(long = "coupling", short = 'J', default_value_t = 1.0)]
    pub coupling: f64,
    /// Comma separated unit-cell lengths, e.g. "2,4,6".
    #[arg(long)]
    pub lengths: Option<String>,
    /// Fixed bond dimension for every point.
    #[arg(long, default_value_t = 100, conflicts_with = "refine_bond_dimension")]
    pub bond_dimension: u32,
    /// Refine the bond dimension at the largest unit cell first.
    #[arg(long)]
    pub refine_bond_dimension: bool,
    /// Convergence threshold.
    #[arg(long, default_value_t = 1e-5)]
    pub threshold: f64,
    /// Judge relative instead of absolute differences.
    #[arg(long)]
    pub relative: bool,
    /// Write an SVG figure into the configured plot directory.
    #[arg(long)]
    pub plot: bool,
    /// Export the per-step table as CSV.
    #[arg(long)]
    pub csv: Option<PathBuf>,
    /// Write the response here instead of stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub fn run(args: &UnitCellArgs, toolbox: &Toolbox) -> Result<(), Box<dyn Error>> {
    let request = ToolRequest::AnalyzeUnitCellConvergence(UnitCellRequest {
        g: args.g,
        coupling_j: args.coupling,
        unit_cell_lengths: args.lengths.clone(),
        bond_dimension: (!args.refine_bond_dimension).then_some(args.bond_dimension),
        threshold: args.threshold,
        rule: if args.relative {
            DeltaRule::Relative
        } else {
            DeltaRule::Absolute
        },
        make_plot: args.plot,
    });
    emit(
        &toolbox.dispatch(&request),
        args.out.as_deref(),
        args.csv.as_ref(),
    )
}
