#![deny(missing_docs)]
#![doc = "Core types and structured errors for the TFIM convergence toolkit."]

pub mod errors;
/// Model parameters and control knobs.
pub mod params;
pub mod provenance;
mod result;
pub mod rng;
/// Canonical JSON and hashing helpers.
#[path = "serde.rs"]
pub mod serde_io;

pub use errors::{ErrorInfo, TfimError};
pub use params::{
    ensure_chain_length, ControlAxis, ControlParameter, ModelParameters, MAX_ED_CHAIN_LENGTH,
};
pub use provenance::RunProvenance;
pub use result::SolverResult;
pub use rng::{derive_substream_seed, RngHandle};
pub use serde_io::{stable_hash_string, to_canonical_json_bytes};
