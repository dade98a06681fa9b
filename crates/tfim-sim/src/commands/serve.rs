use std::error::Error;
use std::io;

use clap::Args;
use tfim_tools::Toolbox;

#[derive(Args, Debug)]
pub struct ServeArgs {}

pub fn run(_args: &ServeArgs, toolbox: &Toolbox) -> Result<(), Box<dyn Error>> {
    tfim_sim::serve(toolbox, io::stdin().lock(), io::stdout().lock())?;
    Ok(())
}
