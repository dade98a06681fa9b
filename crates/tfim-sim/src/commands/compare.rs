use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use tfim_tools::{ComparisonRequest, ToolRequest, Toolbox};

use super::emit;

#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Transverse field g.
    #[arg(long)]
    pub g: f64,
    /// Ising coupling J.
    #[arg(long = "coupling", short = 'J', default_value_t = 1.0)]
    pub coupling: f64,
    /// Comma separated periodic chain lengths (each at most 12).
    #[arg(long, default_value = "4,6,8,10,12")]
    pub chain_lengths: String,
    /// Unit cell of the infinite solve.
    #[arg(long, default_value_t = 2)]
    pub unit_cell_length: u32,
    /// Bond dimension of the infinite solve.
    #[arg(long, default_value_t = 100)]
    pub bond_dimension: u32,
    /// Write an SVG figure into the configured plot directory.
    #[arg(long)]
    pub plot: bool,
    /// Write the response here instead of stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub fn run(args: &CompareArgs, toolbox: &Toolbox) -> Result<(), Box<dyn Error>> {
    let request = ToolRequest::CompareFiniteInfinite(ComparisonRequest {
        g: args.g,
        coupling_j: args.coupling,
        chain_lengths: args.chain_lengths.clone(),
        unit_cell_length: args.unit_cell_length,
        bond_dimension: args.bond_dimension,
        make_plot: args.plot,
    });
    emit(&toolbox.dispatch(&request), args.out.as_deref(), None)
}
