use std::error::Error;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tfim_sim::{export_csv, write_response};
use tfim_tools::ToolResponse;

pub mod batch;
pub mod bond_dimension;
pub mod compare;
pub mod diagonalize;
pub mod ground_state;
pub mod serve;
pub mod unit_cell;

/// Prints the response (or writes it to `out`), exports CSV when asked, and
/// turns a failed response into a non-zero exit.
pub fn emit(
    response: &ToolResponse,
    out: Option<&Path>,
    csv: Option<&PathBuf>,
) -> Result<(), Box<dyn Error>> {
    match out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            write_response(response, fs::File::create(path)?)?;
        }
        None => write_response(response, io::stdout().lock())?,
    }
    if let Some(path) = csv {
        if response.result.is_some() {
            export_csv(response, path)?;
        }
    }
    match &response.error {
        Some(error) => Err(error.clone().into()),
        None => Ok(()),
    }
}
