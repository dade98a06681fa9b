use std::sync::{Mutex, PoisonError};

use tfim_core::{ControlParameter, ModelParameters, SolverResult, TfimError};

/// Uniform call interface to a ground-state engine.
///
/// Implementations are stateless from the caller's point of view: identical
/// inputs give identical results up to the engine's internal tolerance.
pub trait SolverAdapter: Send + Sync {
    /// Stable name recorded in report provenance.
    fn name(&self) -> &str;

    /// Rejects inputs this adapter cannot handle, without running anything.
    ///
    /// Orchestrators call this for every planned control value before the
    /// first solve.
    fn check(&self, _model: &ModelParameters, _control: ControlParameter) -> Result<(), TfimError> {
        Ok(())
    }

    /// Solves for the ground state of `model` at the given precision.
    fn solve(
        &self,
        model: &ModelParameters,
        control: ControlParameter,
    ) -> Result<SolverResult, TfimError>;
}

impl<S: SolverAdapter + ?Sized> SolverAdapter for &S {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn check(&self, model: &ModelParameters, control: ControlParameter) -> Result<(), TfimError> {
        (**self).check(model, control)
    }

    fn solve(
        &self,
        model: &ModelParameters,
        control: ControlParameter,
    ) -> Result<SolverResult, TfimError> {
        (**self).solve(model, control)
    }
}

impl<S: SolverAdapter + ?Sized> SolverAdapter for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn check(&self, model: &ModelParameters, control: ControlParameter) -> Result<(), TfimError> {
        (**self).check(model, control)
    }

    fn solve(
        &self,
        model: &ModelParameters,
        control: ControlParameter,
    ) -> Result<SolverResult, TfimError> {
        (**self).solve(model, control)
    }
}

/// Records every call issued to the wrapped adapter, in order.
///
/// A call is recorded before it is delegated, so failed solves are counted
/// too.
#[derive(Debug)]
pub struct CallCounter<S> {
    inner: S,
    calls: Mutex<Vec<ControlParameter>>,
}

impl<S> CallCounter<S> {
    /// Wraps an adapter with an empty call log.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Control values of all calls issued so far.
    pub fn calls(&self) -> Vec<ControlParameter> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of calls issued so far.
    pub fn count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns the wrapped adapter.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: SolverAdapter> SolverAdapter for CallCounter<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn check(&self, model: &ModelParameters, control: ControlParameter) -> Result<(), TfimError> {
        self.inner.check(model, control)
    }

    fn solve(
        &self,
        model: &ModelParameters,
        control: ControlParameter,
    ) -> Result<SolverResult, TfimError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(control);
        self.inner.solve(model, control)
    }
}
