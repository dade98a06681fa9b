#![deny(missing_docs)]
#![doc = "Ground-state solver adapters for the TFIM convergence toolkit."]

mod adapter;
mod ed;
pub mod exact;
pub mod external;
/// Matrix-free periodic chain Hamiltonian.
pub mod hamiltonian;
pub mod lanczos;

pub use adapter::{CallCounter, SolverAdapter};
pub use ed::ExactDiagonalization;
pub use exact::{periodic_chain_energy_density, thermodynamic_energy_density};
pub use external::{ExternalIdmrg, IdmrgRequest, IdmrgResponse, IdmrgSettings};
pub use lanczos::{lowest_eigenpair, Eigenpair, LanczosOptions};
