use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use tfim_tools::{DiagonalizeRequest, ToolRequest, Toolbox};

use super::emit;

#[derive(Args, Debug)]
pub struct DiagonalizeArgs {
    /// Number of sites of the periodic chain (at most 12).
    #[arg(long = "length", short = 'L')]
    pub length: u32,
    /// Ising coupling J.
    #[arg(long = "coupling", short = 'J', default_value_t = 1.0)]
    pub coupling: f64,
    /// Transverse field h.
    #[arg(long = "field")]
    pub field: f64,
    /// Write the response here instead of stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub fn run(args: &DiagonalizeArgs, toolbox: &Toolbox) -> Result<(), Box<dyn Error>> {
    let request = ToolRequest::Diagonalize(DiagonalizeRequest {
        length: args.length,
        coupling_j: args.coupling,
        field: args.field,
    });
    emit(&toolbox.dispatch(&request), args.out.as_deref(), None)
}
