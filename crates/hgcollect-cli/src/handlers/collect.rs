use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Result};

use hgcollect_hg::{HgClient, LogReader};
use hgcollect_runtime::Collector;
use hgcollect_store::Store;
use hgcollect_types::RepoList;

use crate::args::OutputFormat;
use crate::output;

pub fn handle(
    reader: LogReader<HgClient>,
    store: Store,
    repos: RepoList,
    workers: usize,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    let total = repos.len();
    let plain = format == OutputFormat::Plain;

    if plain {
        output::print_run_start(total, workers);
    }

    let collector = Collector::new(Arc::new(reader), Arc::new(store), workers);

    let started = Instant::now();
    let summary = collector.run(&repos, move |progress| {
        // Progress lines would corrupt json output; failures still surface
        // through the summary there.
        if plain {
            output::print_progress(&progress, verbose);
        }
    })?;

    match format {
        OutputFormat::Plain => output::print_summary(&summary, started.elapsed()),
        OutputFormat::Json => output::print_summary_json(&summary)?,
    }

    if summary.persist_failures > 0 {
        bail!(
            "{} of {} repositories failed to persist",
            summary.persist_failures,
            total
        );
    }
    Ok(())
}
