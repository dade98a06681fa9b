//! Provenance attached to every emitted report.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::TfimError;
use crate::serde_io::stable_hash_string;

/// Provenance information attached to every serialized report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RunProvenance {
    /// Canonical hash of the request that produced the data.
    pub input_hash: String,
    /// Name of the solver adapter that produced the numbers.
    pub solver: String,
    /// RFC 3339 timestamp recording when the report was generated.
    pub created_at: String,
    /// Version map for all tools involved in the run.
    pub tool_versions: BTreeMap<String, String>,
}

impl RunProvenance {
    /// Stamps a request with its canonical hash and the current time.
    pub fn capture<T: Serialize>(request: &T, solver: impl Into<String>) -> Result<Self, TfimError> {
        let mut tool_versions = BTreeMap::new();
        tool_versions.insert(
            env!("CARGO_PKG_NAME").to_string(),
            env!("CARGO_PKG_VERSION").to_string(),
        );
        Ok(Self {
            input_hash: stable_hash_string(request)?,
            solver: solver.into(),
            created_at: chrono::Utc::now().to_rfc3339(),
            tool_versions,
        })
    }
}
