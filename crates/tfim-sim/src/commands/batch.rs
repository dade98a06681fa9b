use std::error::Error;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::Args;
use tfim_sim::{read_requests, run_batch, write_response, BatchOptions};
use tfim_tools::Toolbox;

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// JSON-lines file (or JSON array) of tool requests.
    #[arg(long = "in")]
    pub input: PathBuf,
    /// Worker threads; 0 uses every core.
    #[arg(long, default_value_t = 0)]
    pub threads: usize,
    /// JSON-lines output; stdout when omitted.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub fn run(args: &BatchArgs, toolbox: &Toolbox) -> Result<(), Box<dyn Error>> {
    let requests = read_requests(&args.input)?;
    let responses = run_batch(
        toolbox,
        &requests,
        &BatchOptions {
            threads: args.threads,
        },
    )?;
    let mut sink: Box<dyn Write> = match &args.out {
        Some(path) => Box::new(fs::File::create(path)?),
        None => Box::new(io::stdout().lock()),
    };
    for response in &responses {
        write_response(response, &mut sink)?;
    }
    Ok(())
}
