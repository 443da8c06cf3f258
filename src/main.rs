//! bloblog CLI: reconcile a directory against a blob store.

use anyhow::Result;
use bloblog::engine::arg_parser::Cli;
use bloblog::engine::handle_run;
use clap::Parser;
use std::time::Instant;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
