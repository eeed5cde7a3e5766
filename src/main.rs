//! pathscan CLI: list the entries of a directory tree that pass the given filters.

use anyhow::Result;
use clap::Parser;
use pathscan::engine::Cli;
use pathscan::engine::handle_run;
use std::time::Instant;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
