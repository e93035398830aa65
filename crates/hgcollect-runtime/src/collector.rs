use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;

use hgcollect_hg::{LogReader, QueryLogs};
use hgcollect_store::Store;
use hgcollect_types::{RepoList, Results};

use crate::pool::WorkerPool;

const PERSIST_ATTEMPTS: usize = 3;
const PERSIST_BACKOFF: Duration = Duration::from_millis(100);

/// Capability to collect one repository's history as data.
pub trait Obtain: Send + Sync {
    fn obtain(&self, repo: &Path) -> Results;
}

/// Capability to durably write one repository's results.
pub trait Persist: Send + Sync {
    fn persist(&self, results: &Results) -> hgcollect_store::Result<()>;
}

impl<Q> Obtain for LogReader<Q>
where
    Q: QueryLogs + Send + Sync,
{
    fn obtain(&self, repo: &Path) -> Results {
        LogReader::obtain(self, repo)
    }
}

impl Persist for Store {
    fn persist(&self, results: &Results) -> hgcollect_store::Result<()> {
        Store::persist(self, results)
    }
}

/// Progress notifications emitted while a run executes.
///
/// Dispatched events fire from the submitting thread in list order;
/// completion events fire from workers in whatever order pipelines finish.
#[derive(Debug, Clone)]
pub enum CollectProgress {
    RepoDispatched {
        index: usize,
        total: usize,
        repo: PathBuf,
    },
    RepoCompleted {
        repo: PathBuf,
        records: usize,
        errors: usize,
    },
    PersistFailed {
        repo: PathBuf,
        message: String,
    },
}

/// Aggregate outcome of one collection run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub repos: usize,
    pub records: usize,
    pub errors: usize,
    pub persist_failures: usize,
}

/// Fans repository pipelines out over a bounded worker pool.
///
/// Obtain/persist capabilities are supplied at construction and held behind
/// `Arc` so every dispatched pipeline owns a handle for the duration of its
/// pool slot.
pub struct Collector<O, P> {
    obtainer: Arc<O>,
    persister: Arc<P>,
    workers: usize,
}

impl<O, P> Collector<O, P>
where
    O: Obtain + 'static,
    P: Persist + 'static,
{
    pub fn new(obtainer: Arc<O>, persister: Arc<P>, workers: usize) -> Self {
        Self {
            obtainer,
            persister,
            workers: workers.max(1),
        }
    }

    /// Process every repository exactly once, at most `workers` at a time.
    ///
    /// Submission follows list order; completion order is unconstrained.
    /// Returns only after every dispatched pipeline has finished, so no
    /// in-flight persistence work is lost. A persist failure never aborts
    /// the run: it is retried while transient, then counted and reported.
    pub fn run<F>(&self, repos: &RepoList, on_progress: F) -> Result<RunSummary>
    where
        F: Fn(CollectProgress) + Send + Sync + 'static,
    {
        let pool = WorkerPool::new(self.workers).context("failed to start worker pool")?;
        let notify = Arc::new(on_progress);
        let records = Arc::new(AtomicUsize::new(0));
        let errors = Arc::new(AtomicUsize::new(0));
        let failures = Arc::new(AtomicUsize::new(0));

        let total = repos.len();
        for (index, repo) in repos.iter().enumerate() {
            (*notify)(CollectProgress::RepoDispatched {
                index: index + 1,
                total,
                repo: repo.clone(),
            });

            let obtainer = Arc::clone(&self.obtainer);
            let persister = Arc::clone(&self.persister);
            let notify = Arc::clone(&notify);
            let records = Arc::clone(&records);
            let errors = Arc::clone(&errors);
            let failures = Arc::clone(&failures);
            let repo = repo.clone();

            pool.execute(move || {
                let results = obtainer.obtain(&repo);
                let (n_records, n_errors) = (results.records.len(), results.events.len());
                records.fetch_add(n_records, Ordering::Relaxed);
                errors.fetch_add(n_errors, Ordering::Relaxed);

                match persist_with_retry(persister.as_ref(), &results) {
                    Ok(()) => (*notify)(CollectProgress::RepoCompleted {
                        repo,
                        records: n_records,
                        errors: n_errors,
                    }),
                    Err(err) => {
                        failures.fetch_add(1, Ordering::Relaxed);
                        (*notify)(CollectProgress::PersistFailed {
                            repo,
                            message: err.to_string(),
                        });
                    }
                }
            });
        }

        pool.join();

        Ok(RunSummary {
            repos: total,
            records: records.load(Ordering::Relaxed),
            errors: errors.load(Ordering::Relaxed),
            persist_failures: failures.load(Ordering::Relaxed),
        })
    }
}

fn persist_with_retry<P: Persist>(persister: &P, results: &Results) -> hgcollect_store::Result<()> {
    let mut attempt = 1;
    loop {
        match persister.persist(results) {
            Ok(()) => return Ok(()),
            Err(err) if err.is_transient() && attempt < PERSIST_ATTEMPTS => {
                attempt += 1;
                std::thread::sleep(PERSIST_BACKOFF);
            }
            Err(err) => return Err(err),
        }
    }
}
