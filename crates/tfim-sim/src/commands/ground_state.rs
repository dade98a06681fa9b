use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use tfim_tools::{GroundStateRequest, Precision, ToolRequest, Toolbox};

use super::emit;

#[derive(Args, Debug)]
pub struct GroundStateArgs {
    /// Transverse field g.
    #[arg(long)]
    pub g: f64,
    /// Ising coupling J.
    #[arg(long = "coupling", short = 'J', default_value_t = 1.0)]
    pub coupling: f64,
    /// Unit-cell length of the infinite MPS.
    #[arg(long, default_value_t = 2)]
    pub unit_cell_length: u32,
    /// Fixed bond dimension; refines adaptively when omitted.
    #[arg(long)]
    pub bond_dimension: Option<u32>,
    /// First bond dimension of the refinement.
    #[arg(long, conflicts_with = "bond_dimension")]
    pub start: Option<u32>,
    /// Convergence threshold of the refinement.
    #[arg(long, conflicts_with = "bond_dimension")]
    pub threshold: Option<f64>,
    /// Call ceiling of the refinement.
    #[arg(long, conflicts_with = "bond_dimension")]
    pub max_calls: Option<u32>,
    /// Write the response here instead of stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub fn run(args: &GroundStateArgs, toolbox: &Toolbox) -> Result<(), Box<dyn Error>> {
    let precision = match args.bond_dimension {
        Some(bond_dimension) => Precision::Fixed { bond_dimension },
        None => Precision::Adaptive {
            start: args.start,
            growth: None,
            threshold: args.threshold,
            rule: None,
            max_calls: args.max_calls,
        },
    };
    let request = ToolRequest::AnalyzeGroundState(GroundStateRequest {
        g: args.g,
        coupling_j: args.coupling,
        unit_cell_length: args.unit_cell_length,
        precision,
    });
    emit(&toolbox.dispatch(&request), args.out.as_deref(), None)
}
