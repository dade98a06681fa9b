//! Response encoding and CSV export.

use std::fs;
use std::io::Write;
use std::path::Path;

use tfim_conv::{write_csv, ConvergenceReport};
use tfim_core::{to_canonical_json_bytes, ErrorInfo, TfimError};
use tfim_tools::{ToolResponse, UnitCellResult};

/// Writes `response` as one line of canonical JSON.
pub fn write_response<W: Write>(response: &ToolResponse, mut out: W) -> Result<(), TfimError> {
    let mut bytes = to_canonical_json_bytes(response)?;
    bytes.push(b'\n');
    out.write_all(&bytes)
        .and_then(|()| out.flush())
        .map_err(|err| TfimError::Io(ErrorInfo::new("output.write", err.to_string())))
}

/// Writes the per-step table of a convergence response as CSV.
///
/// Accepts the payload of either convergence tool, including partial
/// results of failed runs.
pub fn export_csv(response: &ToolResponse, path: &Path) -> Result<(), TfimError> {
    let report = response
        .result_as::<UnitCellResult>()
        .map(|result| result.report)
        .or_else(|_| response.result_as::<ConvergenceReport>())?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| io_error(path, err))?;
    }
    let file = fs::File::create(path).map_err(|err| io_error(path, err))?;
    write_csv(&report, file)
}

fn io_error(path: &Path, err: std::io::Error) -> TfimError {
    TfimError::Io(
        ErrorInfo::new("output.csv", err.to_string())
            .with_context("path", path.display().to_string()),
    )
}
