use tfim_core::TfimError;
use tfim_solve::{ExactDiagonalization, ExternalIdmrg, SolverAdapter};

use crate::config::ToolConfig;

/// Builds fresh solver adapters for each request.
pub trait SolverFactory: Send + Sync {
    /// Exact diagonalization adapter.
    fn exact(&self) -> Result<Box<dyn SolverAdapter>, TfimError>;

    /// Infinite-chain adapter. `bond_dimension` is the fixed value used
    /// when the unit cell is swept.
    fn idmrg(&self, bond_dimension: Option<u32>) -> Result<Box<dyn SolverAdapter>, TfimError>;
}

/// Factory backed by the Lanczos engine and the configured external command.
#[derive(Debug, Clone, Default)]
pub struct DefaultSolverFactory {
    config: ToolConfig,
}

impl DefaultSolverFactory {
    /// Factory using `config`.
    pub fn new(config: ToolConfig) -> Self {
        Self { config }
    }
}

impl SolverFactory for DefaultSolverFactory {
    fn exact(&self) -> Result<Box<dyn SolverAdapter>, TfimError> {
        Ok(Box::new(ExactDiagonalization::new(self.config.lanczos)))
    }

    fn idmrg(&self, bond_dimension: Option<u32>) -> Result<Box<dyn SolverAdapter>, TfimError> {
        let adapter = ExternalIdmrg::new(
            self.config.idmrg.command.clone(),
            self.config.idmrg.settings,
            bond_dimension,
        )?;
        Ok(Box::new(adapter))
    }
}
