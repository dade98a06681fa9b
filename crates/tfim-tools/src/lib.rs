#![deny(missing_docs)]
#![doc = "Tool capability surface exposing TFIM solvers and convergence studies to an agent."]

pub mod config;
mod factory;
pub mod requests;
pub mod responses;
mod toolbox;
mod values;

pub use config::{IdmrgConfig, OutputConfig, RefineConfig, ToolConfig, CONFIG_ENV};
pub use factory::{DefaultSolverFactory, SolverFactory};
pub use requests::{
    BondDimensionRequest, ComparisonRequest, DiagonalizeRequest, GroundStateRequest, Precision,
    ToolDescriptor, ToolRequest, UnitCellRequest, TOOLS,
};
pub use responses::{
    ComparisonResult, DiagonalizeResult, GroundStateResult, ToolResponse, UnitCellResult,
};
pub use toolbox::Toolbox;
pub use values::{parse_values, values_or};
