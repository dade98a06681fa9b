//! Model parameters and the precision knob swept by the orchestrators.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorInfo, TfimError};

/// Hard ceiling on the chain length accepted by exact diagonalization.
///
/// The state space grows as `2^L`; twelve sites keep a single solve well
/// within memory.
pub const MAX_ED_CHAIN_LENGTH: u32 = 12;

/// Immutable physical parameters of a transverse-field Ising chain.
///
/// `length` is the chain length for exact diagonalization and the unit-cell
/// length for infinite DMRG.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawModelParameters")]
pub struct ModelParameters {
    coupling_j: f64,
    transverse_field: f64,
    length: u32,
}

#[derive(Deserialize)]
struct RawModelParameters {
    coupling_j: f64,
    transverse_field: f64,
    length: u32,
}

impl TryFrom<RawModelParameters> for ModelParameters {
    type Error = TfimError;

    fn try_from(raw: RawModelParameters) -> Result<Self, Self::Error> {
        ModelParameters::new(raw.coupling_j, raw.transverse_field, raw.length)
    }
}

impl ModelParameters {
    /// Validates and builds a parameter record.
    pub fn new(coupling_j: f64, transverse_field: f64, length: u32) -> Result<Self, TfimError> {
        if !coupling_j.is_finite() {
            return Err(TfimError::Validation(
                ErrorInfo::new("model.coupling", "coupling J must be finite")
                    .with_context("coupling_j", coupling_j.to_string()),
            ));
        }
        if !transverse_field.is_finite() {
            return Err(TfimError::Validation(
                ErrorInfo::new("model.field", "transverse field must be finite")
                    .with_context("transverse_field", transverse_field.to_string()),
            ));
        }
        if length == 0 {
            return Err(TfimError::validation(
                "model.length",
                "chain or unit-cell length must be at least 1",
            ));
        }
        Ok(Self {
            coupling_j,
            transverse_field,
            length,
        })
    }

    /// Ising coupling `J`.
    pub fn coupling_j(&self) -> f64 {
        self.coupling_j
    }

    /// Transverse field `h` (called `g` in the iDMRG tools).
    pub fn transverse_field(&self) -> f64 {
        self.transverse_field
    }

    /// Chain length or unit-cell length.
    pub fn length(&self) -> u32 {
        self.length
    }

    /// Returns a copy with a different length.
    pub fn with_length(&self, length: u32) -> Result<Self, TfimError> {
        Self::new(self.coupling_j, self.transverse_field, length)
    }

    /// Rejects chains longer than [`MAX_ED_CHAIN_LENGTH`].
    pub fn ensure_diagonalizable(&self) -> Result<(), TfimError> {
        ensure_chain_length(self.length)
    }
}

/// Rejects a chain length that exact diagonalization cannot handle.
pub fn ensure_chain_length(length: u32) -> Result<(), TfimError> {
    if length > MAX_ED_CHAIN_LENGTH {
        return Err(TfimError::Validation(
            ErrorInfo::new(
                "model.chain_too_long",
                "chain length exceeds the exact diagonalization ceiling",
            )
            .with_context("length", length.to_string())
            .with_context("max", MAX_ED_CHAIN_LENGTH.to_string())
            .with_hint("L > 12 may allocate too much memory; use iDMRG instead"),
        ));
    }
    Ok(())
}

/// Axis along which precision is increased.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlAxis {
    /// Unit-cell size (or finite chain length for exact diagonalization).
    UnitCellSize,
    /// Maximum bond dimension of the matrix product state.
    BondDimension,
}

impl ControlAxis {
    /// Short label used in reports, plot titles and file names.
    pub fn label(&self) -> &'static str {
        match self {
            ControlAxis::UnitCellSize => "unit_cell_length",
            ControlAxis::BondDimension => "bond_dimension",
        }
    }
}

impl fmt::Display for ControlAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single value of the precision knob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ControlParameter {
    /// Axis the value belongs to.
    pub axis: ControlAxis,
    /// Knob value, always at least 1.
    pub value: u32,
}

impl ControlParameter {
    /// Builds a control value, rejecting zero.
    pub fn new(axis: ControlAxis, value: u32) -> Result<Self, TfimError> {
        if value == 0 {
            return Err(TfimError::Validation(
                ErrorInfo::new("control.zero", "control values must be at least 1")
                    .with_context("axis", axis.label()),
            ));
        }
        Ok(Self { axis, value })
    }

    /// Unit-cell size control value.
    pub fn unit_cell(value: u32) -> Result<Self, TfimError> {
        Self::new(ControlAxis::UnitCellSize, value)
    }

    /// Bond dimension control value.
    pub fn bond_dimension(value: u32) -> Result<Self, TfimError> {
        Self::new(ControlAxis::BondDimension, value)
    }
}

impl fmt::Display for ControlParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.axis, self.value)
    }
}
