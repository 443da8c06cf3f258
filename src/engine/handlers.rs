//! CLI command handler: load config, open collaborators, run one pass.

use anyhow::Result;
use log::debug;

use crate::engine::arg_parser::Cli;
use crate::engine::catalog::open_catalog;
use crate::engine::store::open_store;
use crate::pipeline::run_pass;
use crate::utils::{LoadedConfig, WorkerThreadLimits, load_config, setup_logging};
use crate::PassReport;

/// Layer CLI overrides on top of the file config.
fn apply_cli(cli: &Cli, config: &mut LoadedConfig) {
    let opts = &mut config.opts;
    if let Some(root) = &cli.root {
        opts.root = root.clone();
    }
    if let Some(n) = cli.workers {
        opts.workers = WorkerThreadLimits::current().cap(n as usize);
    }
    opts.exclude.extend(cli.exclude.iter().cloned());
    if let Some(p) = cli.parallel_walk {
        opts.parallel_walk = p;
    }
    opts.verbose = cli.verbose.unwrap_or(false);
}

/// Run one reconciliation pass as configured. Errors returned here are fatal (configuration,
/// catalog unavailable); per-file failures only show up in the report and the log.
pub fn handle_run(cli: &Cli) -> Result<PassReport> {
    setup_logging(cli.verbose.unwrap_or(false));
    let mut config = load_config(&cli.config)?;
    apply_cli(cli, &mut config);
    debug!(
        "{} CONFIG:{:#?}",
        env!("CARGO_PKG_NAME").to_uppercase(),
        config.opts
    );

    let catalog = open_catalog(&config.catalog)?;
    let store = open_store(&config.storage)?;
    run_pass(&config.opts, &config.rules, catalog, store)
}
