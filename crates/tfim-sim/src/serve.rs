//! JSON-lines tool server.
//!
//! Each non-empty input line is one request; each answer is one line of
//! canonical JSON. Requests are handled strictly one after another.

use std::io::{BufRead, Write};

use tfim_core::{ErrorInfo, TfimError};
use tfim_tools::{SolverFactory, Toolbox};
use tracing::info;

use crate::output::write_response;

/// Answers requests from `input` until end of input. Returns the number of
/// requests handled.
pub fn serve<F, R, W>(toolbox: &Toolbox<F>, input: R, mut output: W) -> Result<usize, TfimError>
where
    F: SolverFactory,
    R: BufRead,
    W: Write,
{
    let mut handled = 0;
    for line in input.lines() {
        let line =
            line.map_err(|err| TfimError::Io(ErrorInfo::new("serve.read", err.to_string())))?;
        if line.trim().is_empty() {
            continue;
        }
        let response = toolbox.dispatch_json(&line);
        write_response(&response, &mut output)?;
        handled += 1;
    }
    info!(handled, "input closed; server stopping");
    Ok(handled)
}
