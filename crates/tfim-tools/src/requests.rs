//! Tool requests as received from the agent.

use serde::{Deserialize, Serialize};
use tfim_conv::{DeltaRule, Growth};

const fn default_coupling() -> f64 {
    1.0
}

const fn default_unit_cell() -> u32 {
    2
}

const fn default_fixed_bond_dimension() -> Option<u32> {
    Some(100)
}

const fn default_bond_dimension() -> u32 {
    100
}

const fn default_unit_cell_threshold() -> f64 {
    1e-5
}

const fn default_bond_threshold() -> f64 {
    1e-6
}

fn default_chain_lengths() -> String {
    "4,6,8,10,12".to_string()
}

/// Exact diagonalization of one periodic chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiagonalizeRequest {
    /// Chain length, at most 12.
    #[serde(rename = "L")]
    pub length: u32,
    /// Ising coupling.
    #[serde(rename = "J", default = "default_coupling")]
    pub coupling_j: f64,
    /// Transverse field.
    #[serde(rename = "h")]
    pub field: f64,
}

/// Precision policy of a ground-state analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Precision {
    /// One solve at a fixed bond dimension.
    Fixed {
        /// Bond dimension to use.
        bond_dimension: u32,
    },
    /// Refinement over the bond dimension; unset fields come from the
    /// configuration.
    Adaptive {
        /// First bond dimension.
        #[serde(default)]
        start: Option<u32>,
        /// Growth rule.
        #[serde(default)]
        growth: Option<Growth>,
        /// Convergence threshold.
        #[serde(default)]
        threshold: Option<f64>,
        /// Delta measure.
        #[serde(default)]
        rule: Option<DeltaRule>,
        /// Call ceiling.
        #[serde(default)]
        max_calls: Option<u32>,
    },
}

impl Default for Precision {
    fn default() -> Self {
        Precision::Adaptive {
            start: None,
            growth: None,
            threshold: None,
            rule: None,
            max_calls: None,
        }
    }
}

/// Ground-state properties of the infinite chain.
///
/// On the wire the precision is given either as `bond_dimension` (a number
/// fixes it, `null` or absence refines it) or as a full `precision` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GroundStateFields")]
pub struct GroundStateRequest {
    /// Transverse field.
    pub g: f64,
    /// Ising coupling.
    #[serde(rename = "J")]
    pub coupling_j: f64,
    /// Unit-cell length.
    pub unit_cell_length: u32,
    /// Precision policy.
    pub precision: Precision,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct GroundStateFields {
    g: f64,
    #[serde(rename = "J", default = "default_coupling")]
    coupling_j: f64,
    #[serde(default = "default_unit_cell")]
    unit_cell_length: u32,
    #[serde(default)]
    bond_dimension: Option<u32>,
    #[serde(default)]
    precision: Option<Precision>,
}

impl TryFrom<GroundStateFields> for GroundStateRequest {
    type Error = String;

    fn try_from(fields: GroundStateFields) -> Result<Self, Self::Error> {
        let precision = match (fields.bond_dimension, fields.precision) {
            (Some(_), Some(_)) => {
                return Err("give either `bond_dimension` or `precision`, not both".to_string())
            }
            (Some(bond_dimension), None) => Precision::Fixed { bond_dimension },
            (None, precision) => precision.unwrap_or_default(),
        };
        Ok(Self {
            g: fields.g,
            coupling_j: fields.coupling_j,
            unit_cell_length: fields.unit_cell_length,
            precision,
        })
    }
}

/// Convergence of the energy in the unit-cell length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnitCellRequest {
    /// Transverse field.
    pub g: f64,
    /// Ising coupling.
    #[serde(rename = "J", default = "default_coupling")]
    pub coupling_j: f64,
    /// Comma separated unit-cell lengths; the default schedule when unset.
    #[serde(default)]
    pub unit_cell_lengths: Option<String>,
    /// Fixed bond dimension. An explicit `null` asks for a refinement at the
    /// largest unit cell first.
    #[serde(default = "default_fixed_bond_dimension")]
    pub bond_dimension: Option<u32>,
    /// Convergence threshold.
    #[serde(default = "default_unit_cell_threshold")]
    pub threshold: f64,
    /// Delta measure.
    #[serde(default)]
    pub rule: DeltaRule,
    /// Whether to write a figure.
    #[serde(default)]
    pub make_plot: bool,
}

/// Convergence of the energy in the bond dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BondDimensionRequest {
    /// Transverse field.
    pub g: f64,
    /// Ising coupling.
    #[serde(rename = "J", default = "default_coupling")]
    pub coupling_j: f64,
    /// Unit-cell length.
    #[serde(default = "default_unit_cell")]
    pub unit_cell_length: u32,
    /// Comma separated bond dimensions; the default schedule when unset.
    #[serde(default)]
    pub bond_dimensions: Option<String>,
    /// Convergence threshold.
    #[serde(default = "default_bond_threshold")]
    pub threshold: f64,
    /// Delta measure.
    #[serde(default)]
    pub rule: DeltaRule,
    /// Whether to write a figure.
    #[serde(default)]
    pub make_plot: bool,
}

/// Finite-size exact energies against the infinite chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComparisonRequest {
    /// Transverse field.
    pub g: f64,
    /// Ising coupling.
    #[serde(rename = "J", default = "default_coupling")]
    pub coupling_j: f64,
    /// Comma separated periodic chain lengths, each at most 12.
    #[serde(default = "default_chain_lengths")]
    pub chain_lengths: String,
    /// Unit cell of the infinite solve.
    #[serde(default = "default_unit_cell")]
    pub unit_cell_length: u32,
    /// Bond dimension of the infinite solve.
    #[serde(default = "default_bond_dimension")]
    pub bond_dimension: u32,
    /// Whether to write a figure.
    #[serde(default)]
    pub make_plot: bool,
}

/// Any tool invocation, tagged by `tool`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tool", rename_all = "snake_case")]
pub enum ToolRequest {
    /// See [`DiagonalizeRequest`].
    Diagonalize(DiagonalizeRequest),
    /// See [`GroundStateRequest`].
    AnalyzeGroundState(GroundStateRequest),
    /// See [`UnitCellRequest`].
    AnalyzeUnitCellConvergence(UnitCellRequest),
    /// See [`BondDimensionRequest`].
    AnalyzeBondDimensionConvergence(BondDimensionRequest),
    /// See [`ComparisonRequest`].
    CompareFiniteInfinite(ComparisonRequest),
}

/// Name and one-line description of a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ToolDescriptor {
    /// Value of the `tool` tag.
    pub name: &'static str,
    /// What the tool computes.
    pub description: &'static str,
}

/// Every tool the toolbox answers.
pub const TOOLS: [ToolDescriptor; 5] = [
    ToolDescriptor {
        name: "diagonalize",
        description: "Exact ground state energy per site of a periodic chain (L <= 12)",
    },
    ToolDescriptor {
        name: "analyze_ground_state",
        description: "Infinite-chain ground state at fixed or adaptively refined bond dimension",
    },
    ToolDescriptor {
        name: "analyze_unit_cell_convergence",
        description: "Energy per site against unit-cell length with a convergence verdict",
    },
    ToolDescriptor {
        name: "analyze_bond_dimension_convergence",
        description: "Energy per site against bond dimension with a convergence verdict",
    },
    ToolDescriptor {
        name: "compare_finite_infinite",
        description: "Finite-size exact energies extrapolated in 1/L against the infinite chain",
    },
];

impl ToolRequest {
    /// Value of the `tool` tag.
    pub fn name(&self) -> &'static str {
        let idx = match self {
            ToolRequest::Diagonalize(_) => 0,
            ToolRequest::AnalyzeGroundState(_) => 1,
            ToolRequest::AnalyzeUnitCellConvergence(_) => 2,
            ToolRequest::AnalyzeBondDimensionConvergence(_) => 3,
            ToolRequest::CompareFiniteInfinite(_) => 4,
        };
        TOOLS[idx].name
    }
}
