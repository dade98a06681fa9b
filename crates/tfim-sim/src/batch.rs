//! Independent requests on a rayon pool.
//!
//! Each request gets its own adapters and trace; nothing mutable is shared
//! between jobs. Responses come back in input order.

use std::fs;
use std::path::Path;

use rayon::prelude::*;
use serde_json::Value;
use tfim_core::{ErrorInfo, TfimError};
use tfim_tools::{SolverFactory, ToolResponse, Toolbox};
use tracing::info;

/// Pool settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchOptions {
    /// Worker threads; zero lets rayon decide.
    pub threads: usize,
}

/// Splits a batch file into raw requests.
///
/// A file starting with `[` is a JSON array of requests; anything else is
/// JSON lines.
pub fn read_requests(path: &Path) -> Result<Vec<String>, TfimError> {
    let text = fs::read_to_string(path).map_err(|err| {
        TfimError::Io(
            ErrorInfo::new("batch.read", err.to_string())
                .with_context("path", path.display().to_string()),
        )
    })?;
    if text.trim_start().starts_with('[') {
        let items: Vec<Value> = serde_json::from_str(&text)
            .map_err(|err| TfimError::Serde(ErrorInfo::new("batch.decode", err.to_string())))?;
        return Ok(items.iter().map(Value::to_string).collect());
    }
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect())
}

/// Dispatches every request in parallel and returns the responses in the
/// order of `requests`.
pub fn run_batch<F: SolverFactory>(
    toolbox: &Toolbox<F>,
    requests: &[String],
    options: &BatchOptions,
) -> Result<Vec<ToolResponse>, TfimError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.threads)
        .build()
        .map_err(|err| TfimError::Io(ErrorInfo::new("batch.thread_pool", err.to_string())))?;
    let responses: Vec<ToolResponse> = pool.install(|| {
        requests
            .par_iter()
            .map(|request| toolbox.dispatch_json(request))
            .collect()
    });
    let failed = responses.iter().filter(|response| !response.ok).count();
    info!(requests = responses.len(), failed, "batch finished");
    Ok(responses)
}
