#![deny(missing_docs)]
#![doc = "Request plumbing behind the `tfim-sim` binary: JSON-lines serving, parallel batches and output helpers."]

pub mod batch;
pub mod logging;
pub mod output;
pub mod serve;

pub use batch::{read_requests, run_batch, BatchOptions};
pub use output::{export_csv, write_response};
pub use serve::serve;
