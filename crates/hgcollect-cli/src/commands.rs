use std::time::Duration;

use anyhow::{bail, Context, Result};

use hgcollect_hg::{HgClient, LogReader};
use hgcollect_runtime::discover_repos;
use hgcollect_store::Store;
use hgcollect_types::RepoList;

use crate::args::Cli;
use crate::handlers;

pub fn run(cli: Cli) -> Result<()> {
    // Storage problems abort the run before any repository is touched.
    let store = Store::open(&cli.db)
        .with_context(|| format!("failed to open database {}", cli.db.display()))?;

    let (repos, workers) = resolve_workload(&cli)?;

    let client = HgClient::new()
        .with_program(cli.hg_bin.as_str())
        .with_timeout(Duration::from_secs(cli.timeout_secs));
    let reader = LogReader::new(client);

    handlers::collect::handle(reader, store, repos, workers, cli.format, cli.verbose)
}

fn resolve_workload(cli: &Cli) -> Result<(RepoList, usize)> {
    if let Some(parent) = &cli.repos_dir {
        let repos = discover_repos(parent)?;
        if repos.is_empty() {
            bail!("no repositories found under {}", parent.display());
        }
        Ok((repos, cli.workers))
    } else if let Some(repo) = &cli.repo {
        Ok((vec![repo.clone()], 1))
    } else {
        bail!("no repositories specified: pass --repos-dir or --repo");
    }
}
