use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use commands::{
    batch::{self, BatchArgs},
    bond_dimension::{self, BondDimensionArgs},
    compare::{self, CompareArgs},
    diagonalize::{self, DiagonalizeArgs},
    ground_state::{self, GroundStateArgs},
    serve::{self, ServeArgs},
    unit_cell::{self, UnitCellArgs},
};
use tfim_tools::{ToolConfig, Toolbox, TOOLS};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "tfim-sim", about = "Transverse-field Ising ground states and convergence studies")]
struct Cli {
    /// TOML configuration file; falls back to $TFIM_CONFIG, then defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Exact ground state of a periodic chain (L <= 12).
    Diagonalize(DiagonalizeArgs),
    /// Infinite-chain ground state at fixed or refined bond dimension.
    GroundState(GroundStateArgs),
    /// Energy convergence in the unit-cell length.
    UnitCell(UnitCellArgs),
    /// Energy convergence in the bond dimension.
    BondDimension(BondDimensionArgs),
    /// Finite-size exact energies against the infinite chain.
    Compare(CompareArgs),
    /// Answer JSON-lines requests on stdin until EOF.
    Serve(ServeArgs),
    /// Run a file of independent requests in parallel.
    Batch(BatchArgs),
    /// List the available tools.
    Tools,
}

fn main() -> Result<(), Box<dyn Error>> {
    tfim_sim::logging::init();
    let cli = Cli::parse();
    let config = ToolConfig::discover(cli.config.as_deref())?;
    let toolbox = Toolbox::from_config(config);
    match cli.command {
        Command::Diagonalize(args) => diagonalize::run(&args, &toolbox),
        Command::GroundState(args) => ground_state::run(&args, &toolbox),
        Command::UnitCell(args) => unit_cell::run(&args, &toolbox),
        Command::BondDimension(args) => bond_dimension::run(&args, &toolbox),
        Command::Compare(args) => compare::run(&args, &toolbox),
        Command::Serve(args) => serve::run(&args, &toolbox),
        Command::Batch(args) => batch::run(&args, &toolbox),
        Command::Tools => {
            println!("{}", serde_json::to_string_pretty(&TOOLS)?);
            Ok(())
        }
    }
}
