use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use tfim_conv::DeltaRule;
use tfim_tools::{BondDimensionRequest, ToolRequest, Toolbox};

use super::emit;

#[derive(Args, Debug)]
pub struct BondDimensionArgs {
    /// Transverse field g.
    #[arg(long)]
    pub g: f64,
    /// Ising coupling J.
    #[arg(long = "coupling", short = 'J', default_value_t = 1.0)]
    pub coupling: f64,
    /// Unit-cell length of the infinite MPS.
    #[arg(long, default_value_t = 2)]
    pub unit_cell_length: u32,
    /// Comma separated bond dimensions, e.g. "50,100,150".
    #[arg(long)]
    pub values: Option<String>,
    /// Convergence threshold.
    #[arg(long, default_value_t = 1e-6)]
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

pub fn run(args: &BondDimensionArgs, toolbox: &Toolbox) -> Result<(), Box<dyn Error>> {
    let request = ToolRequest::AnalyzeBondDimensionConvergence(BondDimensionRequest {
        g: args.g,
        coupling_j: args.coupling,
        unit_cell_length: args.unit_cell_length,
        bond_dimensions: args.values.clone(),
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
